//! Service client stub rendering.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::error::GenError;
use crate::r#gen::Context;
use crate::schema::ServiceIr;

/// Render one service client: a thin wrapper over the runtime client with
/// one method per rpc, each bound to its fully qualified call path.
pub fn render_service(ctx: &Context<'_>, service: &ServiceIr) -> Result<TokenStream, GenError> {
    let client_ident = format_ident!("{}Client", service.ident);

    let mut methods = Vec::new();
    for method in &service.methods {
        let name = format_ident!("{}", method.name);
        let path = &method.path;
        let request_type = ctx.type_path(&method.input_type)?;
        let response_type = ctx.type_path(&method.output_type)?;

        if method.server_streaming {
            methods.push(quote! {
                pub fn #name(
                    &self,
                    request: #request_type,
                    options: wirekit_client::CallOptions,
                ) -> wirekit_client::MessageStream<#response_type> {
                    self.client.server_stream(#path, request, options)
                }
            });
        } else {
            methods.push(quote! {
                pub async fn #name(
                    &self,
                    request: #request_type,
                    options: wirekit_client::CallOptions,
                ) -> wirekit_core::Response<#response_type> {
                    self.client.unary(#path, request, options).await
                }
            });
        }
    }

    Ok(quote! {
        #[derive(Clone)]
        pub struct #client_ident {
            client: wirekit_client::GrpcClient,
        }

        impl #client_ident {
            pub fn new(client: wirekit_client::GrpcClient) -> Self {
                Self { client }
            }

            #(#methods)*
        }
    })
}
