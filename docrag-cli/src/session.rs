//! Question loops over a prepared pipeline.

use docrag::RagPipeline;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::error;

use crate::display::render_answer;

/// Questions asked with `--no_interactive`.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "このドキュメントの内容を教えて",
    "この文書の主なトピックは何ですか？",
    "重要なポイントを3つ教えて",
    "このドキュメントで説明されている概念は何ですか？",
];

const BANNER: &str = "============================================================";
const RULE: &str = "----------------------------------------";

/// True for `exit`, `quit` (any case) or `終了`.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") || input == "終了"
}

/// Ask one question and print the answer. Failures are logged, not returned.
pub async fn answer_one(pipeline: &RagPipeline, question: &str) {
    match pipeline.ask(question).await {
        Ok(answer) => print!("{}", render_answer(&answer)),
        Err(e) => error!(error = %e, "failed to answer question"),
    }
}

/// Run every sample question in order.
pub async fn run_samples(pipeline: &RagPipeline) {
    for question in SAMPLE_QUESTIONS {
        println!("\n質問: {question}");
        println!("{RULE}");
        answer_one(pipeline, question).await;
        println!("\n{BANNER}");
    }
}

/// Prompt for questions until an exit command, Ctrl-C or Ctrl-D.
pub async fn run_interactive(pipeline: &RagPipeline, editor: &mut DefaultEditor) -> anyhow::Result<()> {
    println!("\n{BANNER}");
    println!("ドキュメントに関する質問ができます。");
    println!("終了するには 'exit'、'quit' または '終了' と入力してください。");
    println!("{BANNER}");

    loop {
        println!("\n{RULE}");
        let line = match editor.readline("質問を入力してください: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        if is_exit_command(&line) {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        let _ = editor.add_history_entry(question);
        answer_one(pipeline, question).await;
        println!("\n{BANNER}");
    }

    println!("\nありがとうございました！");
    Ok(())
}
