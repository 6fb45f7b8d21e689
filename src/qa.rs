//! The question-answering pipeline: retrieve product context, then generate
//! a grounded answer.

use serde::Serialize;

use crate::{
    answer::AnswerClient,
    error::{Error, Result},
    matcher::Matcher,
    retrieval::Retriever,
};

/// Canned answer when retrieval finds nothing for the product.
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant information found in the product documentation.";

/// Chunks of context fetched per answered question.
pub const ANSWER_TOP_K: usize = 3;

/// Characters of the top chunk quoted by the no-LLM fallback.
const EXCERPT_CHARS: usize = 300;

/// An answer with the documentation files it was grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct ProductAnswer {
    pub answer: String,
    pub context_sources: Vec<String>,
}

/// Answer a question about a known product.
///
/// 1. Validate the product id against the catalog
/// 2. Retrieve `top_k` context chunks filtered to the product
/// 3. Generate an answer (or quote an excerpt when `use_llm` is off)
///
/// Empty retrieval yields the canned [`NO_CONTEXT_ANSWER`] rather than an
/// error; answer-generation failures propagate with their error kind
/// intact.
pub fn answer_question(
    matcher: &Matcher,
    retriever: &Retriever,
    client: &AnswerClient,
    product_id: &str,
    question: &str,
    top_k: usize,
    use_llm: bool,
) -> Result<ProductAnswer> {
    if !matcher.validate_product_id(product_id) {
        return Err(Error::NotFound {
            kind: "product",
            name: product_id.to_string(),
        });
    }

    let retrieved = retriever.retrieve(question, Some(product_id), top_k);
    if retrieved.is_empty() {
        return Ok(ProductAnswer {
            answer: NO_CONTEXT_ANSWER.to_string(),
            context_sources: Vec::new(),
        });
    }

    let context: Vec<String> =
        retrieved.iter().map(|r| r.chunk.text.clone()).collect();
    let mut context_sources: Vec<String> = Vec::new();
    for result in &retrieved {
        if !context_sources.contains(&result.chunk.source) {
            context_sources.push(result.chunk.source.clone());
        }
    }

    let answer = if use_llm {
        client.generate(question, &context)?
    } else {
        excerpt_answer(&context[0])
    };

    Ok(ProductAnswer {
        answer,
        context_sources,
    })
}

fn excerpt_answer(top_chunk: &str) -> String {
    format!(
        "Based on the documentation: {}...",
        top_chunk.chars().take(EXCERPT_CHARS).collect::<String>()
    )
}

/// Human-readable answer output.
pub fn format_human(answer: &ProductAnswer) {
    println!("{}", answer.answer);
    if !answer.context_sources.is_empty() {
        println!("\nSources: {}", answer.context_sources.join(", "));
    }
}

/// JSON answer output.
pub fn format_json(answer: &ProductAnswer) -> Result<()> {
    println!("{}", serde_json::to_string(answer)?);
    Ok(())
}
