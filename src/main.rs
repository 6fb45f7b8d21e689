use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use prodsense::{
    AnswerClient, Catalog, DataDir, Matcher, Retriever, Settings,
    embedding::embedder_from_settings,
    error,
    qa::{self, ProductAnswer},
    recognize::{self, UNRECOGNIZED_ANSWER},
};

mod cli;

use cli::{Cli, Command};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("PRODSENSE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let settings = Settings::from_env();

    match cli.command {
        Command::Recognize(args) => {
            cmd_recognize(&data_dir, &settings, &args)?;
        }
        Command::Answer(args) => {
            cmd_answer(&data_dir, &settings, &args)?;
        }
        Command::Query(args) => {
            cmd_query(&data_dir, &settings, &args)?;
        }
        Command::Rebuild => {
            cmd_rebuild(&data_dir, &settings)?;
        }
        Command::Status(args) => {
            cmd_status(&data_dir, &settings, args.json)?;
        }
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn open_retriever(
    data_dir: &DataDir,
    settings: &Settings,
) -> error::Result<Retriever> {
    Ok(Retriever::open(
        embedder_from_settings(settings),
        data_dir.docs_dir(),
        data_dir.index_dir()?,
        settings.clone(),
    ))
}

fn load_matcher(data_dir: &DataDir, settings: &Settings) -> Matcher {
    Matcher::new(
        Catalog::load_or_empty(&data_dir.catalog_csv()),
        settings.clone(),
    )
}

fn cmd_recognize(
    data_dir: &DataDir,
    settings: &Settings,
    args: &cli::RecognizeArgs,
) -> error::Result<()> {
    let text = read_input_text(args)?;
    let matcher = load_matcher(data_dir, settings);
    let top_k = args.count.unwrap_or(settings.top_k_matches);

    let recognition = recognize::recognize(&matcher, &text, top_k);

    // With --ask, run the Q&A pipeline against the best candidate. A
    // failed answer is reported in-band so the recognition result is not
    // lost with it.
    let answer = match &args.ask {
        Some(question) => Some(match &recognition.best_product_id {
            Some(best_product_id) => {
                let retriever = open_retriever(data_dir, settings)?;
                retriever.ensure_index()?;
                let client = AnswerClient::from_settings(settings);

                qa::answer_question(
                    &matcher,
                    &retriever,
                    &client,
                    best_product_id,
                    question,
                    qa::ANSWER_TOP_K,
                    !args.no_llm,
                )
                .unwrap_or_else(|err| {
                    warn!("answer generation failed: {err}");
                    ProductAnswer {
                        answer: format!("Failed to generate answer: {err}"),
                        context_sources: Vec::new(),
                    }
                })
            }
            None => ProductAnswer {
                answer: UNRECOGNIZED_ANSWER.to_string(),
                context_sources: Vec::new(),
            },
        }),
        None => None,
    };

    if args.json {
        if args.ask.is_some() {
            let mut value = serde_json::json!({ "recognition": recognition });
            value["answer"] = serde_json::to_value(&answer)?;
            println!("{value}");
        } else {
            recognize::format_json(&recognition)?;
        }
    } else {
        recognize::format_human(&recognition);
        if let Some(answer) = &answer {
            println!();
            qa::format_human(answer);
        }
    }

    Ok(())
}

fn read_input_text(args: &cli::RecognizeArgs) -> error::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(std::io::read_to_string(std::io::stdin())?)
}

fn cmd_answer(
    data_dir: &DataDir,
    settings: &Settings,
    args: &cli::AnswerArgs,
) -> error::Result<()> {
    let matcher = load_matcher(data_dir, settings);
    let retriever = open_retriever(data_dir, settings)?;
    retriever.ensure_index()?;
    let client = AnswerClient::from_settings(settings);

    let answer = qa::answer_question(
        &matcher,
        &retriever,
        &client,
        &args.product_id,
        &args.question,
        args.count.unwrap_or(qa::ANSWER_TOP_K),
        !args.no_llm,
    )?;

    if args.json {
        qa::format_json(&answer)?;
    } else {
        qa::format_human(&answer);
    }
    Ok(())
}

fn cmd_query(
    data_dir: &DataDir,
    settings: &Settings,
    args: &cli::QueryArgs,
) -> error::Result<()> {
    let retriever = open_retriever(data_dir, settings)?;
    retriever.ensure_index()?;

    let results = retriever.retrieve(
        &args.query,
        args.product.as_deref(),
        args.count.unwrap_or(settings.top_k_retrieval),
    );

    if args.json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                serde_json::json!({
                    "rank": i + 1,
                    "distance": r.distance,
                    "product_id": r.chunk.product_id,
                    "source": r.chunk.source,
                    "text": r.chunk.text,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(rows));
    } else if results.is_empty() {
        println!("No chunks retrieved.");
    } else {
        for (i, result) in results.iter().enumerate() {
            println!(
                "{:>3}. [{:.3}] {}:{}",
                i + 1,
                result.distance,
                result.chunk.product_id,
                result.chunk.source
            );
            println!("     {}", preview(&result.chunk.text, 160));
        }
        println!("\n{} chunk(s)", results.len());
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut preview: String = text.chars().take(max_chars).collect();
    if preview.len() < text.len() {
        preview.push_str("...");
    }
    preview
}

fn cmd_rebuild(data_dir: &DataDir, settings: &Settings) -> error::Result<()> {
    let retriever = open_retriever(data_dir, settings)?;
    eprintln!("Rebuilding index from {}...", data_dir.docs_dir().display());
    let count = retriever.build_index()?;
    if count == 0 {
        eprintln!("No documents found; index left empty.");
    } else {
        eprintln!("Indexed {count} chunks.");
    }
    Ok(())
}

fn cmd_status(
    data_dir: &DataDir,
    settings: &Settings,
    json: bool,
) -> error::Result<()> {
    let catalog = Catalog::load_or_empty(&data_dir.catalog_csv());
    let retriever = open_retriever(data_dir, settings)?;
    let client = AnswerClient::from_settings(settings);
    let embedder = embedder_from_settings(settings);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "data_dir": data_dir.root().display().to_string(),
                "products": catalog.len(),
                "indexed_chunks": retriever.chunk_count(),
                "index_initialized": retriever.is_initialized(),
                "embed_model": embedder.model_id(),
                "chat_model": client.model_id(),
                "answers_configured": client.is_configured(),
            })
        );
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Products: {}", catalog.len());
        if retriever.is_initialized() {
            println!("Indexed chunks: {}", retriever.chunk_count());
        } else {
            println!("Index: not built (run `prodsense rebuild`)");
        }
        println!("Embedding model: {}", embedder.model_id());
        println!(
            "Chat model: {} ({})",
            client.model_id(),
            if client.is_configured() {
                "configured"
            } else {
                "no API key"
            }
        );
    }
    Ok(())
}
