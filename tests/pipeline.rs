//! End-to-end pipeline test: recognize a product from extracted text, then
//! answer a question about it from indexed documentation.

use std::sync::Arc;

use prodsense::{
    AnswerClient, Catalog, Matcher, Retriever, Settings,
    embedding::HashEmbedder,
    qa,
    recognize::recognize,
};

fn setup() -> (tempfile::TempDir, Matcher, Retriever, AnswerClient) {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let index = tmp.path().join("index");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::create_dir_all(&index).unwrap();

    std::fs::write(
        tmp.path().join("catalog.csv"),
        "product_id,title,model,brand\n\
         iphone-15-pro-max,iPhone 15 Pro Max,A3105,Apple\n\
         galaxy-s24,Galaxy S24,SM-S921,Samsung\n",
    )
    .unwrap();

    std::fs::write(
        docs.join("iphone-15-pro-max.txt"),
        "the iphone 15 pro max has a battery capacity of 4422 mah and a \
         display brightness of up to 2000 nits outdoors with the titanium \
         frame keeping the weight at 221 grams overall "
            .repeat(3),
    )
    .unwrap();
    std::fs::write(
        docs.join("galaxy-s24.txt"),
        "the galaxy s24 ships with a 4000 mah battery and a flat screen \
         panel rated at 2600 nits peak brightness in an aluminum body that \
         weighs 167 grams with the base configuration "
            .repeat(3),
    )
    .unwrap();

    let settings = Settings {
        chunk_size: 40,
        chunk_overlap: 10,
        ..Settings::default()
    };

    let matcher = Matcher::new(
        Catalog::load(&tmp.path().join("catalog.csv")).unwrap(),
        settings.clone(),
    );
    let retriever =
        Retriever::open(Arc::new(HashEmbedder), docs, index, settings);
    retriever.build_index().unwrap();

    let client = AnswerClient::new(
        "test-model".into(),
        "http://localhost:0".into(),
        None,
    );
    (tmp, matcher, retriever, client)
}

#[test]
fn recognize_then_answer_about_the_best_match() {
    let (_tmp, matcher, retriever, client) = setup();

    let recognition = recognize(&matcher, "iphone 15 pro max", 3);
    let best = recognition.best_product_id.as_deref().unwrap();
    assert_eq!(best, "iphone-15-pro-max");
    assert!(recognition.candidates[0].score >= 0.9);

    let answer = qa::answer_question(
        &matcher,
        &retriever,
        &client,
        best,
        "what is the battery capacity",
        qa::ANSWER_TOP_K,
        false,
    )
    .unwrap();

    assert!(answer.answer.starts_with("Based on the documentation: "));
    assert!(answer.answer.contains("battery"));
    assert_eq!(answer.context_sources, vec!["iphone-15-pro-max.txt"]);
}

#[test]
fn retrieval_stays_inside_the_recognized_product() {
    let (_tmp, matcher, retriever, _client) = setup();

    let recognition = recognize(&matcher, "samsung galaxy s24 sm-s921", 3);
    let best = recognition.best_product_id.as_deref().unwrap();
    assert_eq!(best, "galaxy-s24");

    let results = retriever.retrieve("battery mah", Some(best), 5);
    assert!(!results.is_empty());
    for result in &results {
        assert_eq!(result.chunk.product_id, "galaxy-s24");
    }
}

#[test]
fn empty_extraction_flows_through_as_empty_results() {
    let (_tmp, matcher, _retriever, _client) = setup();

    let recognition = recognize(&matcher, "", 3);
    assert!(recognition.candidates.is_empty());
    assert!(recognition.best_product_id.is_none());
}

#[test]
fn persisted_index_serves_a_fresh_process() {
    let (tmp, matcher, retriever, client) = setup();
    drop(retriever);

    // A new retriever over the same data directory loads the snapshot
    // instead of re-embedding.
    let settings = Settings {
        chunk_size: 40,
        chunk_overlap: 10,
        ..Settings::default()
    };
    let reopened = Retriever::open(
        Arc::new(HashEmbedder),
        tmp.path().join("docs"),
        tmp.path().join("index"),
        settings,
    );
    assert!(reopened.is_initialized());

    let answer = qa::answer_question(
        &matcher,
        &reopened,
        &client,
        "iphone-15-pro-max",
        "how bright is the display",
        qa::ANSWER_TOP_K,
        false,
    )
    .unwrap();
    assert!(answer.answer.contains("documentation"));
}
