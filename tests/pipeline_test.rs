use std::fs::{self, File};
use std::path::Path;

use breedcheck::evaluation::{
    adjust_results_isadog, classify_images, labels_from_filenames, pet_label, Annotated, PetRecord,
    ResultSet, Summary,
};
use breedcheck::{evaluate, Diagnostic, EvaluationOptions, ReplayClassifier, Vocabulary};
use env_logger::{Builder, Env};

// Initialize test logger
fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

fn dognames() -> Vocabulary {
    ["maltese", "collie", "beagle", "boston terrier", "dalmatian", "coach dog"]
        .into_iter()
        .collect()
}

#[test]
fn test_filename_to_pet_label() {
    assert_eq!(pet_label("Boston_terrier_02259.jpg").as_deref(), Some("boston terrier"));
}

#[test]
fn test_maltese_matches_term_wise() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let classifier: ReplayClassifier =
        [("Maltese_00123.jpg", "Maltese dog, Maltese terrier, Maltese")].into_iter().collect();

    let labeled = labels_from_filenames(["Maltese_00123.jpg"]);
    let matched = classify_images(labeled, Path::new("pet_images"), &classifier, 1)?;

    let record = matched.get("Maltese_00123.jpg").unwrap();
    assert_eq!(record.pet_label, "maltese");
    assert_eq!(record.classifier_label(), "maltese dog, maltese terrier, maltese");
    assert!(record.stage.is_match);
    Ok(())
}

#[test]
fn test_cat_is_not_a_dog() -> Result<(), Box<dyn std::error::Error>> {
    let vocabulary: Vocabulary = ["maltese", "collie"].into_iter().collect();
    let classifier: ReplayClassifier = [("cat_01.jpg", "tabby cat, cat")].into_iter().collect();

    let matched = classify_images(labels_from_filenames(["cat_01.jpg"]), Path::new("."), &classifier, 1)?;
    let annotated = adjust_results_isadog(matched, &vocabulary);

    let record = annotated.get("cat_01.jpg").unwrap();
    assert_eq!(record.pet_label, "cat");
    assert!(!record.pet_is_dog());
    assert!(!record.classifier_is_dog());
    Ok(())
}

fn forty_records() -> ResultSet<Annotated> {
    (0..40)
        .map(|i| {
            let record = if i < 30 {
                // 30 dogs, all recognised as dogs, 28 with the right breed
                PetRecord::annotated("beagle", "beagle", i < 28, true, true)
            } else {
                PetRecord::annotated("cat", "tabby", false, false, false)
            };
            (format!("image_{:02}.jpg", i), record)
        })
        .collect()
}

#[test]
fn test_forty_image_summary() {
    let summary = Summary::from_results(&forty_records());
    assert_eq!(summary.n_images, 40);
    assert_eq!(summary.n_dogs_img, 30);
    assert_eq!(summary.n_notdogs_img, 10);
    assert_eq!(summary.pct_correct_dogs, 100.0);
    assert!((summary.pct_correct_breed - 93.333).abs() < 0.01);
    assert_eq!(summary.pct_correct_notdogs, 100.0);
}

#[test]
fn test_summary_is_idempotent() {
    let results = forty_records();
    let first = Summary::from_results(&results);
    let second = Summary::from_results(&results);
    assert_eq!(first.pct_correct_breed.to_bits(), second.pct_correct_breed.to_bits());
    assert_eq!(first, second);
}

#[test]
fn test_summary_invariants_hold_for_every_flag_combination() {
    // Every subset of the 8 possible (match, pet dog, classifier dog) rows
    for mask in 0u32..256 {
        let results: ResultSet<Annotated> = (0..8u32)
            .filter(|row| mask & (1 << row) != 0)
            .map(|row| {
                let record = PetRecord::annotated("a", "b", row & 1 != 0, row & 2 != 0, row & 4 != 0);
                (format!("{}.jpg", row), record)
            })
            .collect();

        let summary = Summary::from_results(&results);
        assert_eq!(summary.n_images, summary.n_dogs_img + summary.n_notdogs_img);
        assert!(summary.n_correct_breed <= summary.n_dogs_img);
        assert!(summary.n_correct_dogs <= summary.n_dogs_img);
        assert!(summary.n_correct_notdogs <= summary.n_notdogs_img);
        for (key, stat) in summary.entries() {
            if key.starts_with("pct_") {
                let value = stat.as_f64();
                assert!((0.0..=100.0).contains(&value), "{} out of range: {}", key, value);
            }
        }
        if summary.n_dogs_img == 0 {
            assert_eq!(summary.pct_correct_dogs, 0.0);
            assert_eq!(summary.pct_correct_breed, 0.0);
        }
        if summary.n_notdogs_img == 0 {
            assert_eq!(summary.pct_correct_notdogs, 0.0);
        }
    }
}

#[test]
fn test_duplicate_filename_is_reported() {
    let labeled = labels_from_filenames(["Collie_03797.jpg", "Collie_03797.jpg"]);
    assert_eq!(labeled.len(), 1);
    assert_eq!(
        labeled.diagnostics(),
        &[Diagnostic::DuplicateFile { filename: "Collie_03797.jpg".to_string() }]
    );
}

#[test]
fn test_end_to_end_directory_evaluation() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    for name in [
        "Collie_03797.jpg",
        "Dalmatian_04017.jpg",
        "Beagle_01125.jpg",
        "gecko_80.jpg",
        "Unlabelled_01.jpg",
        ".DS_Store",
    ] {
        File::create(dir.path().join(name))?;
    }
    fs::create_dir(dir.path().join("thumbnails"))?;

    let classifier: ReplayClassifier = [
        ("Collie_03797.jpg", "collie"),
        ("Dalmatian_04017.jpg", "dalmatian, coach dog, carriage dog"),
        ("Beagle_01125.jpg", "walker hound, walker foxhound, beagle mix, coach dog"),
        ("gecko_80.jpg", "common newt, triturus vulgaris"),
    ]
    .into_iter()
    .collect();

    let evaluation = evaluate(dir.path(), &dognames(), &classifier, &EvaluationOptions { jobs: 2 })?;
    let summary = evaluation.summary;

    assert_eq!(summary.n_images, 5);
    assert_eq!(summary.n_dogs_img, 3);
    assert_eq!(summary.n_notdogs_img, 2);
    assert_eq!(summary.n_match, 2);
    assert_eq!(summary.n_correct_breed, 2);
    assert_eq!(summary.n_correct_dogs, 3);
    assert_eq!(summary.n_correct_notdogs, 2);
    assert_eq!(summary.pct_match, 40.0);

    // The unknown file degrades to an empty label instead of aborting the batch
    let unlabelled = evaluation.results.get("Unlabelled_01.jpg").unwrap();
    assert_eq!(unlabelled.classifier_label(), "");
    assert!(matches!(
        evaluation.results.diagnostics(),
        [Diagnostic::ClassifierFailed { filename, .. }] if filename == "Unlabelled_01.jpg"
    ));
    Ok(())
}
