//! `wirekit-gen`: command-line entry point for the generator.
//!
//! Usage: `wirekit-gen <input-dir> <output-dir>`. The input directory is
//! scanned recursively for compiled descriptor sets; the output directory
//! receives the generated module tree.

use wirekit_build::Generator;

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output), None) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: wirekit-gen <input-dir> <output-dir>");
        std::process::exit(2);
    };

    if let Err(err) = Generator::new(input, output).generate() {
        tracing::error!("generation failed: {err}");
        std::process::exit(1);
    }
}
