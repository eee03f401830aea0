//! Live debate driver: glue between the dialogue engine and the broker

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use duolog_core::{Message, Role, StrategyDefinition, Variant};
use duolog_engine::{DialogueEngine, MessageSink};
use duolog_stream::{SessionStatus, StreamBroker};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Sink publishing engine output into a broker session
struct BrokerSink {
    broker: Arc<StreamBroker>,
    debate_id: Uuid,
}

#[async_trait]
impl MessageSink for BrokerSink {
    async fn emit(&self, message: &Message) {
        if let Err(e) = self.broker.publish(self.debate_id, message.clone()).await {
            tracing::warn!(debate_id = %self.debate_id, error = %e, "dropping live message");
        }
    }
}

/// Open a session, seed it with the problem statement and the strategy's
/// system prompts, and start both conversation variants in the
/// background. Returns the debate id for streaming.
pub async fn launch_debate(
    state: &AppState,
    problem: &str,
    strategy_id: &str,
) -> ApiResult<Uuid> {
    if problem.trim().is_empty() {
        return Err(ApiError::Validation("problem must not be empty".to_string()));
    }
    let strategy = state.strategies().get(strategy_id)?;

    let debate_id = Uuid::new_v4();
    let broker = state.broker();
    broker.open_session(debate_id, problem, strategy_id).await?;

    // The problem statement is shown once, before the variant panes split;
    // the system prompts are published per variant for transparency.
    broker
        .publish(debate_id, Message::new(Role::User, problem, Variant::Initial))
        .await?;
    broker
        .publish(
            debate_id,
            Message::new(
                Role::System,
                strategy.simulated_system_prompt(),
                Variant::Simulated,
            ),
        )
        .await?;
    broker
        .publish(
            debate_id,
            Message::new(Role::System, &strategy.system_prompt_a, Variant::Dual),
        )
        .await?;
    broker
        .publish(
            debate_id,
            Message::new(Role::System, &strategy.system_prompt_b, Variant::Dual),
        )
        .await?;

    let state = state.clone();
    let problem = problem.to_string();
    tokio::spawn(async move {
        drive(state, debate_id, problem, strategy).await;
    });

    Ok(debate_id)
}

/// Run both variants concurrently and close the session when they finish.
/// An engine fault closes the session with an error the subscribers see.
async fn drive(state: AppState, debate_id: Uuid, problem: String, strategy: Arc<StrategyDefinition>) {
    let engine = DialogueEngine::new(state.client().clone(), strategy);
    let broker = state.broker();
    let sink = BrokerSink {
        broker: broker.clone(),
        debate_id,
    };

    let (simulated, dual) = tokio::join!(
        engine.run(&problem, Variant::Simulated, &sink),
        engine.run(&problem, Variant::Dual, &sink)
    );

    let status = match (&simulated, &dual) {
        (Ok(_), Ok(_)) => SessionStatus::Complete,
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(%debate_id, error = %e.message, "debate failed");
            SessionStatus::Error(e.message.clone())
        }
    };

    if let Err(e) = broker.close_session(debate_id, status).await {
        tracing::warn!(%debate_id, error = %e, "failed to close debate session");
    }
}
