use std::path::PathBuf;
use std::process::ExitCode;

use figru::{IpeFormat, Options, TextEncoding};
use pico_args::Arguments;

const HELP: &str = "\
figru converts xfig drawings (FIG 3.0 - 3.2) to Ipe XML documents.

USAGE:
  figru [OPTIONS] <figfile> <ipefile>

OPTIONS:
  -h, --help        Prints help information
  -V, --version     Prints version information
  -g                Puts the produced figure into a group
  -c                Uses the crop box for the size of the figure
  -6                Writes Ipe 6 format instead of Ipe 7 format
  -p PREAMBLE       Inserts a LaTeX preamble (e.g. '\\usepackage{amsmath}')
  --utf8            Encodes 8-bit text as proper UTF-8

ARGS:
  <figfile>         Input file
  <ipefile>         Output file

Diagnostics are written to stderr; set RUST_LOG=debug for more detail.
";

#[derive(Debug)]
struct Args {
    options: Options,
    input: PathBuf,
    output: PathBuf,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    let mut options = Options::new()
        .with_group(input.contains("-g"))
        .with_cropbox(input.contains("-c"));
    if input.contains("-6") {
        options = options.with_format(IpeFormat::Ipe6);
    }
    if input.contains("--utf8") {
        options = options.with_text_encoding(TextEncoding::Utf8);
    }
    if let Some(preamble) = input.opt_value_from_str::<_, String>("-p")? {
        options = options.with_preamble(preamble);
    }

    let args = Args {
        options,
        input: input.free_from_str()?,
        output: input.free_from_str()?,
    };
    let rest = input.finish();
    if !rest.is_empty() {
        return Err(pico_args::Error::ArgumentParsingFailed {
            cause: format!("unexpected arguments: {:?}", rest),
        });
    }
    Ok(args)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();

    let args = match collect_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}.\n\n{}", e, HELP);
            return ExitCode::FAILURE;
        }
    };

    let conversion = match figru::convert_file(&args.input, &args.options) {
        Ok(conversion) => conversion,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = std::fs::write(&args.output, &conversion.output) {
        eprintln!("figru: cannot write '{}': {}", args.output.display(), e);
        return ExitCode::FAILURE;
    }

    if !conversion.warnings.is_empty() {
        tracing::info!(
            "converted with {} warning(s)",
            conversion.warnings.len()
        );
    }
    ExitCode::SUCCESS
}
