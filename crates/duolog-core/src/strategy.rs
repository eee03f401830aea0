//! Collaboration strategies: paired system prompts plus a turn policy

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lookup failure for a strategy id
#[derive(Debug, Error)]
#[error("Unknown strategy: {0}")]
pub struct UnknownStrategyError(pub String);

/// A named pair of role prompts and the turn policy governing how the two
/// agents interact. Immutable after registry construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDefinition {
    /// Stable id used in requests ("debate", "cooperative", "teacher-student")
    pub id: String,
    /// System prompt seeding Agent A's history
    pub system_prompt_a: String,
    /// System prompt seeding Agent B's history
    pub system_prompt_b: String,
    /// Number of model invocations per conversation
    pub max_turns: u32,
    /// Sampling temperature for every turn
    pub temperature: f32,
    /// Output token cap for every turn
    pub max_output_tokens: u32,
    /// Cue injected into the prompt on the last turn; the prompts instruct
    /// the model to reply with a "Final Answer:" line when it sees this.
    pub final_turn_instruction: String,
}

impl StrategyDefinition {
    /// Composite prompt for the simulated variant, where one model plays
    /// both agents over a shared transcript.
    pub fn simulated_system_prompt(&self) -> String {
        format!(
            "You are a helpful assistant who will simulate a debate between two agents\u{2014}\
             Agent A and Agent B\u{2014}who are discussing and challenging each other's \
             reasoning about the problem. For each turn, you will generate only the argument \
             or counterargument content, without including any role labels (those will be \
             provided externally). Your responses should be concise and focus on logical \
             reasoning. In your debate, Agent A should take the position described as: \
             \"{}\", while Agent B should act as: \"{}\". At the end of the debate, conclude \
             with a final statement that starts with 'Final Answer:' summarizing the agreed \
             solution.",
            self.system_prompt_a, self.system_prompt_b
        )
    }
}

fn default_policy(
    id: &str,
    system_prompt_a: impl Into<String>,
    system_prompt_b: impl Into<String>,
) -> StrategyDefinition {
    StrategyDefinition {
        id: id.to_string(),
        system_prompt_a: system_prompt_a.into(),
        system_prompt_b: system_prompt_b.into(),
        max_turns: 5,
        temperature: 0.7,
        max_output_tokens: 1000,
        final_turn_instruction: "(final turn)".to_string(),
    }
}

fn debate() -> StrategyDefinition {
    default_policy(
        "debate",
        "You are Agent A, a reasoning agent acting as the proponent in a structured dialogue. \
         Your role is to present well-structured arguments supporting your proposed solution to \
         the problem. Provide clear reasoning, cite relevant principles when applicable. Engage \
         thoughtfully with critiques from Agent B, either by defending your original position \
         with additional reasoning or by refining your answer based on valid criticisms. \
         Remember that your goal is not to 'win' but to collaboratively reach the most accurate \
         solution. IMPORTANT: When you see the prompt '(final turn)', you MUST end your response \
         with 'Final Answer: X', where X is your definitive conclusion. This is critical for \
         evaluation purposes.",
        "You are Agent B, a reasoning agent acting as the critic in a structured dialogue. Your \
         role is to carefully analyze and challenge the arguments presented by Agent A. Ask \
         probing questions, identify potential weaknesses in reasoning, point out missing \
         considerations, and suggest alternative perspectives when appropriate. Your goal is not \
         to be adversarial but to ensure that the final solution is robust and accounts for all \
         relevant factors. Be constructive in your criticism, suggesting improvements rather \
         than merely pointing out flaws. IMPORTANT: When you see the prompt '(final turn)', you \
         MUST end your response with 'Final Answer: X', where X is your definitive conclusion. \
         This is critical for evaluation purposes.",
    )
}

fn cooperative() -> StrategyDefinition {
    default_policy(
        "cooperative",
        "You are Agent A, a reasoning agent responsible for initiating problem-solving \
         approaches. Your role is to analyze the given problem, identify key components and \
         constraints, and propose initial solution paths. Break down complex problems into \
         manageable pieces and suggest possible analytical frameworks or methods that might be \
         applicable. Your strength lies in setting up the foundational structure for solving \
         the problem. Be clear, specific, and open to refinement of your initial ideas. Only \
         when confident enough or seeing a prompt indicating the final turn, conclude with \
         'Final Answer:'",
        "You are Agent B, a reasoning agent focused on developing and extending solution paths. \
         Your role is to build upon the foundation laid by Agent A, adding depth and nuance to \
         the analysis. When Agent A proposes an approach, enhance it by filling in missing \
         details, expanding the reasoning, connecting it to relevant concepts, or contributing \
         complementary perspectives. Avoid simply repeating what Agent A has already covered. \
         Only when confident enough or seeing a prompt indicating the final turn, conclude with \
         'Final Answer:'",
    )
}

fn teacher_student() -> StrategyDefinition {
    default_policy(
        "teacher-student",
        "You are Agent A, a reasoning agent acting as a guide and mentor in this \
         problem-solving dialogue between you and Agent B. Your role is to provide scaffolding \
         for effective reasoning about the problem without simply stating the answer. Use \
         Socratic questioning to help Agent B explore the problem space, highlight important \
         principles or frameworks that might be useful, and gently correct misconceptions while \
         explaining why they're problematic. IMPORTANT: Only respond as yourself (Agent A). DO \
         NOT simulate Agent B's responses. In every turn, include 'Answer: X' with what YOU \
         think is correct, presented as a question to the student. IMPORTANT: When you see the \
         prompt '(final turn)', you MUST end your response with 'Final Answer: X', where X is \
         your definitive conclusion. This is critical for evaluation purposes.",
        "You are Agent B, a reasoning agent engaged in active problem-solving under guidance \
         from Agent A. Your role is to approach the problem thoughtfully, making genuine \
         attempts to work through it step by step. Think aloud about your reasoning process, \
         including points of uncertainty or confusion. When Agent A provides guidance, build \
         upon it to advance your understanding rather than simply accepting it passively. \
         IMPORTANT: Only respond as yourself (Agent B). DO NOT simulate what Agent A might say \
         next. IMPORTANT: When you see the prompt '(final turn)', you MUST end your response \
         with 'Final Answer: X', where X is your definitive conclusion. This is critical for \
         evaluation purposes.",
    )
}

/// Registry of available strategies, loaded once at process start
#[derive(Debug)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<StrategyDefinition>>,
}

impl StrategyRegistry {
    /// Registry with the three built-in strategies
    pub fn builtin() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        for strategy in [debate(), cooperative(), teacher_student()] {
            registry.register(strategy);
        }
        registry
    }

    /// Add a strategy, replacing any previous definition with the same id
    pub fn register(&mut self, strategy: StrategyDefinition) {
        self.strategies
            .insert(strategy.id.clone(), Arc::new(strategy));
    }

    /// Look up a strategy by id
    pub fn get(&self, id: &str) -> Result<Arc<StrategyDefinition>, UnknownStrategyError> {
        self.strategies
            .get(id)
            .cloned()
            .ok_or_else(|| UnknownStrategyError(id.to_string()))
    }

    /// Ids of all registered strategies
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.strategies.keys().cloned().collect();
        ids.sort();
        ids
    }
}
