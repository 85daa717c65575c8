//! Live walkthrough against an OpenAI-compatible endpoint.
//!
//! ```text
//! GROQ_API_KEY=... cargo run --example chat_demo
//! ```

use anyhow::Result;
use chat_context::config::Config;
use chat_context::conversation::{ChatSession, DEFAULT_PREVIEW_CHARS};
use chat_context::extraction::InfoExtractor;
use chat_context::llm::{LlmSummarizer, OpenAiCompatibleClient};
use chat_context::logging::init_tracing;
use chat_context::ConversationConfig;
use std::sync::Arc;
use std::time::Duration;

fn head(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

async fn run_conversation(
    client: &Arc<OpenAiCompatibleClient>,
    config: ConversationConfig,
    topics: &[&str],
) -> Result<ChatSession> {
    let summarizer = Arc::new(LlmSummarizer::new(client.clone(), config.model.clone()));
    let mut chat = ChatSession::new(config, client.clone(), summarizer)?;

    for (i, topic) in topics.iter().enumerate() {
        println!("\nTurn {}: {}", i + 1, topic);
        let reply = chat.process_turn(*topic).await?;
        println!("Response: {}...", head(&reply, 80));
        println!("Stats: {}", chat.stats());
    }

    Ok(chat)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Some("chat-context"))?;
    init_tracing(&config.logging)?;

    let client = Arc::new(OpenAiCompatibleClient::new(config.llm.clone())?);

    println!("CONVERSATION MANAGEMENT");
    let chat = run_conversation(
        &client,
        ConversationConfig::with_limits(6, 2000, 500, 3),
        &[
            "Hi! I'm working on a Python project.",
            "I need help with data structures.",
            "What's the best way to store user data?",
            "Should I use a database or files?",
            "What about SQLite vs PostgreSQL?",
            "How do I connect to a database?",
            "Can you show me code examples?",
            "What about error handling?",
        ],
    )
    .await?;

    println!("\nHISTORY ({} messages)", chat.buffer().len());
    for entry in chat.history(DEFAULT_PREVIEW_CHARS) {
        println!("{}", entry);
    }

    run_conversation(
        &client,
        ConversationConfig::with_limits(4, 1000, 200, 2),
        &[
            "Hello! I need help with machine learning.",
            "What's the difference between supervised and unsupervised learning?",
            "Can you explain neural networks?",
            "How do I implement a simple neural network?",
            "What about deep learning frameworks?",
        ],
    )
    .await?;

    println!("\nINFORMATION EXTRACTION");
    let extractor = InfoExtractor::new(client.clone(), config.llm.model.clone());
    for text in [
        "Hi, I'm John Smith, 28, from New York. Email: john@email.com, Phone: (555) 123-4567",
        "Hello! My name is Sarah. I'm 35 and live in California. Contact: sarah@company.com",
        "Hey, I'm Mike from Seattle. You can reach me at mike@tech.io",
        "I need help with my coding project. Can you assist me?",
    ] {
        println!("\n{}", extractor.report(text).await);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    println!("\nCOMBINED WORKFLOW");
    let summarizer = Arc::new(LlmSummarizer::new(client.clone(), config.llm.model.clone()));
    let mut support = ChatSession::new(
        ConversationConfig::with_limits(5, 1500, 300, 4),
        client.clone(),
        summarizer,
    )?;

    let mut transcript = String::new();
    for (i, text) in [
        "Hi, I'm calling about my account. I'm David Chen, 34, from Vancouver.",
        "My email is david@email.com and phone is 604-555-0198.",
        "I'm having trouble with my subscription billing.",
        "Can you help me understand why I was charged twice?",
        "I'd like to speak to a manager about this issue.",
    ]
    .into_iter()
    .enumerate()
    {
        println!("\nTurn {}: {}", i + 1, text);
        transcript.push_str(&format!("Customer: {}\n", text));

        let reply = support.process_turn(text).await?;
        println!("Agent: {}...", head(&reply, 60));
        transcript.push_str(&format!("Agent: {}\n", reply));

        println!("History: {}", support.stats());
    }

    println!("\n{}", extractor.report(&transcript).await);
    Ok(())
}
