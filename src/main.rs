use argh::{EarlyExit, FromArgs};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use plastic_classifier::{ClassifierConfig, Outcome, PlasticClassifier};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Classify the plastic waste item in an image and print the result as JSON
struct Args {
    /// path to the model weights, defaults to models/ next to the executable
    #[argh(option)]
    model: Option<PathBuf>,

    /// run on the first CUDA device when available
    #[argh(switch)]
    use_gpu: bool,

    /// path to an input image; only the first one is classified
    #[argh(positional)]
    image_paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    // stdout carries the JSON document only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let command = argv
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or(env!("CARGO_PKG_NAME"));
    let rest: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();

    let args = match Args::from_args(&[command], &rest) {
        Ok(args) => args,
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => {
            // --help
            println!("{output}");
            return ExitCode::SUCCESS;
        }
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => {
            // arguments were given, so this is a classification error, not a usage error
            tracing::warn!(error = %output.trim(), "invalid arguments");
            println!("{}", Outcome::error(output.trim()));
            return ExitCode::SUCCESS;
        }
    };

    let mut image_paths = args.image_paths.into_iter();
    let Some(image_path) = image_paths.next() else {
        println!("{}", Outcome::error("No image path provided"));
        return ExitCode::FAILURE;
    };
    let ignored = image_paths.len();
    if ignored > 0 {
        tracing::debug!(ignored, "only the first image path is classified");
    }

    let mut config = ClassifierConfig {
        use_cpu: !args.use_gpu,
        ..Default::default()
    };
    if let Some(model) = args.model {
        config.model_path = model;
    }

    let classifier = PlasticClassifier::new(config);
    println!("{}", classifier.run_inference(&image_path));

    ExitCode::SUCCESS
}
