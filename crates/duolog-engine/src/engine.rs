//! Turn-by-turn conversation driver

use std::sync::Arc;

use thiserror::Error;

use duolog_core::{Message, Role, StrategyDefinition, Variant};
use duolog_llm::{ChatMessage, CompletionClient};

use crate::sink::MessageSink;

/// Internal fault while driving a conversation. Provider failures are not
/// engine errors: they soft-fail into the transcript and the conversation
/// proceeds.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
    /// Transcript produced before the fault
    pub messages: Vec<Message>,
}

impl EngineError {
    fn before_start(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            messages: Vec::new(),
        }
    }
}

/// Drives one conversation per call: `NotStarted -> Turn(1..max) -> Complete`.
///
/// Both variants share this engine; the variant only decides whether the
/// two roles read one shared transcript or two role-bound histories.
/// Turns are strictly sequential, the completion call being the suspend
/// point, so a conversation is always a single task.
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    client: CompletionClient,
    strategy: Arc<StrategyDefinition>,
}

impl DialogueEngine {
    pub fn new(client: CompletionClient, strategy: Arc<StrategyDefinition>) -> Self {
        Self { client, strategy }
    }

    pub fn strategy(&self) -> &StrategyDefinition {
        &self.strategy
    }

    /// Run one full conversation, emitting each agent turn through `sink`
    /// as it is produced. Returns the transcript: the leading user
    /// message followed by exactly `max_turns` agent messages.
    pub async fn run(
        &self,
        problem: &str,
        variant: Variant,
        sink: &dyn MessageSink,
    ) -> Result<Vec<Message>, EngineError> {
        if problem.trim().is_empty() {
            return Err(EngineError::before_start("empty problem statement"));
        }
        if self.strategy.max_turns == 0 {
            return Err(EngineError::before_start(format!(
                "strategy '{}' allows zero turns",
                self.strategy.id
            )));
        }

        let transcript = match variant {
            Variant::Simulated => self.run_simulated(problem, sink).await,
            Variant::Dual => self.run_dual(problem, sink).await,
            Variant::Initial => {
                return Err(EngineError::before_start(
                    "'initial' is not a runnable conversation variant",
                ))
            }
        };

        tracing::info!(
            strategy = %self.strategy.id,
            %variant,
            turns = transcript.len().saturating_sub(1),
            "conversation complete"
        );
        Ok(transcript)
    }

    /// One model plays both agents over a shared transcript. Each turn the
    /// model sees the accumulated history plus a role cue; its reply is
    /// appended role-less to the history and attributed to the cued role.
    async fn run_simulated(&self, problem: &str, sink: &dyn MessageSink) -> Vec<Message> {
        let strategy = &self.strategy;
        let mut transcript = vec![Message::new(Role::User, problem, Variant::Simulated)];
        let mut history = vec![
            ChatMessage::system(strategy.simulated_system_prompt()),
            ChatMessage::user(problem),
        ];

        for turn in 1..=strategy.max_turns {
            let role = Role::for_turn(turn);
            let cue = if turn == strategy.max_turns {
                format!("{} {}: ", strategy.final_turn_instruction, role.label())
            } else {
                format!("{}: ", role.label())
            };

            let mut prompt = history.clone();
            prompt.push(ChatMessage::user(cue));

            let reply = self
                .client
                .complete_soft(&prompt, strategy.temperature, strategy.max_output_tokens)
                .await;

            tracing::debug!(%role, turn, variant = "simulated", "turn produced");
            history.push(ChatMessage::assistant(&reply));

            let message = Message::new(role, reply, Variant::Simulated);
            sink.emit(&message).await;
            transcript.push(message);
        }

        transcript
    }

    /// Two role-bound histories. Each turn the acting agent's own full
    /// history is sent; the reply joins its history as assistant output
    /// and the counterpart's as a labeled user message.
    async fn run_dual(&self, problem: &str, sink: &dyn MessageSink) -> Vec<Message> {
        let strategy = &self.strategy;
        let mut transcript = vec![Message::new(Role::User, problem, Variant::Dual)];
        let mut history_a = vec![
            ChatMessage::system(&strategy.system_prompt_a),
            ChatMessage::user(problem),
        ];
        let mut history_b = vec![
            ChatMessage::system(&strategy.system_prompt_b),
            ChatMessage::user(problem),
        ];

        for turn in 1..=strategy.max_turns {
            let role = Role::for_turn(turn);
            let (own, other) = if role == Role::AgentA {
                (&mut history_a, &mut history_b)
            } else {
                (&mut history_b, &mut history_a)
            };

            if turn == strategy.max_turns {
                own.push(ChatMessage::user(&strategy.final_turn_instruction));
            }

            let reply = self
                .client
                .complete_soft(own, strategy.temperature, strategy.max_output_tokens)
                .await;

            tracing::debug!(%role, turn, variant = "dual", "turn produced");
            own.push(ChatMessage::assistant(&reply));
            other.push(ChatMessage::user(format!("{}: {}", role.label(), reply)));

            let message = Message::new(role, reply, Variant::Dual);
            sink.emit(&message).await;
            transcript.push(message);
        }

        transcript
    }
}
