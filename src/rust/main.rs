use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use breedcheck::report;
use breedcheck::{
    evaluate, BuiltinModel, Classify, EvaluationOptions, ModelManager, OnnxClassifier,
    OptimizationLevel, ReplayClassifier, RuntimeConfig, Vocabulary,
};
use clap::Parser;
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Classify pet images with a CNN and score the results", long_about = None)]
struct Args {
    /// Folder of images to classify; filenames carry the true label
    #[arg(long, default_value = "pet_images/")]
    dir: PathBuf,

    /// CNN model architecture
    #[arg(long, value_enum, default_value_t = BuiltinModel::Vgg)]
    arch: BuiltinModel,

    /// Text file with valid dog names, one per line
    #[arg(long, default_value = "dognames.txt")]
    dogfile: PathBuf,

    /// Number of images classified concurrently
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Replay recorded predictions from a JSON file instead of running a model
    #[arg(long, conflicts_with_all = ["model_path", "fresh"])]
    predictions: Option<PathBuf>,

    /// Use a custom ONNX model instead of the builtin one (requires --labels-path)
    #[arg(long, requires = "labels_path")]
    model_path: Option<PathBuf>,

    /// Class label file for --model-path
    #[arg(long, requires = "model_path")]
    labels_path: Option<PathBuf>,

    /// Directory holding downloaded models
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// ONNX Runtime graph optimisation level
    #[arg(long, value_enum, default_value_t = OptimizationLevel::All)]
    optimization: OptimizationLevel,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// List images whose dog / not-dog classification was wrong
    #[arg(long)]
    print_incorrect_dogs: bool,

    /// List dog images whose breed was misidentified
    #[arg(long)]
    print_incorrect_breed: bool,

    /// Print the full evaluation as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

async fn load_classifier(args: &Args) -> Result<Box<dyn Classify>> {
    if let Some(path) = &args.predictions {
        info!("Replaying recorded predictions from {:?}", path);
        return Ok(Box::new(ReplayClassifier::from_json_file(path)?));
    }

    let runtime_config = RuntimeConfig {
        intra_threads: args.intra_threads,
        optimization_level: args.optimization,
        ..RuntimeConfig::default()
    };
    let builder = OnnxClassifier::builder().with_runtime_config(runtime_config);

    let builder = match (&args.model_path, &args.labels_path) {
        (Some(model_path), Some(labels_path)) => {
            info!("Loading custom model {:?}", model_path);
            builder.with_custom_model(model_path, labels_path, None)?
        }
        _ => {
            let manager = match &args.models_dir {
                Some(dir) => ModelManager::new(dir),
                None => ModelManager::new_default(),
            }
            .context("Cannot create model directory")?;

            if args.fresh {
                info!("Fresh download requested - removing any existing model files...");
                manager.remove_download(args.arch)?;
            }
            manager
                .ensure_model_downloaded(args.arch)
                .await
                .with_context(|| format!("Cannot download the {} model", args.arch))?;

            builder
                .with_models_dir(manager.models_dir())
                .with_model(args.arch)?
        }
    };

    let classifier = builder.build()?;
    info!("Classifier ready: {:?}", classifier.info());
    Ok(Box::new(classifier))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start_time = Instant::now();

    let dognames = Vocabulary::load(&args.dogfile)?;
    let classifier = load_classifier(&args).await?;

    let model_name = match (&args.predictions, &args.model_path) {
        (Some(_), _) => "replay".to_string(),
        (_, Some(path)) => path.display().to_string(),
        _ => args.arch.to_string(),
    };

    let images_dir = args.dir.clone();
    let options = EvaluationOptions { jobs: args.jobs.max(1) };
    let evaluation = tokio::task::spawn_blocking(move || {
        evaluate(&images_dir, &dognames, classifier.as_ref(), &options)
    })
    .await
    .context("Evaluation task panicked")??;

    for diagnostic in evaluation.results.diagnostics() {
        warn!("{}", diagnostic);
    }

    if args.json {
        println!("{}", report::render_json(&evaluation, &model_name)?);
    } else {
        print!("{}", report::render_summary(&evaluation.summary, &model_name));
        if args.print_incorrect_dogs {
            print!("\n{}", report::render_incorrect_dogs(&evaluation.results));
        }
        if args.print_incorrect_breed {
            print!("\n{}", report::render_incorrect_breeds(&evaluation.results));
        }
    }

    info!("Total elapsed runtime: {:.2?}", start_time.elapsed());
    Ok(())
}
