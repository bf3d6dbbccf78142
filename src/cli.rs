//! Interactive chat loop.

use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::{Agent, AgentOutput, ChatTurn};

/// Read a message per line until `exit` or end of input, echoing the agent's
/// reply as it streams. The conversation is kept in memory and passed back as
/// history on the next turn.
pub async fn run_repl<R, W>(
    agent: &Agent,
    input: R,
    mut output: W,
    show_metadata: bool,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut history: Vec<ChatTurn> = Vec::new();

    output
        .write_all(b"Todo Agent CLI - Type 'exit' to quit\n\n")
        .await?;

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        output.write_all(b"Agent: ").await?;
        output.flush().await?;

        let mut reply = String::new();
        let mut outputs = agent.invoke(message, &history, None);
        while let Some(item) = outputs.next().await {
            match item {
                AgentOutput::Metadata(metadata) => {
                    if show_metadata {
                        let json = serde_json::to_string(&metadata)?;
                        output.write_all(format!("\n[metadata] {}", json).as_bytes()).await?;
                    }
                }
                other => {
                    let fragment = other.to_string();
                    output.write_all(fragment.as_bytes()).await?;
                    output.flush().await?;
                    reply.push_str(&fragment);
                }
            }
        }
        output.write_all(b"\n\n").await?;

        history.push(ChatTurn::user(message));
        history.push(ChatTurn::assistant(reply));
    }

    output.flush().await?;
    Ok(())
}
