//! Solution-evolution analysis
//!
//! Classifies how the two agents' stated answers agreed and how their
//! correctness developed across a dialogue. Derived purely from the
//! per-turn extracted answers, never user-supplied.

use duolog_core::{
    extract_answer, AgreementPattern, AnswerRecord, CorrectnessPattern, EvolutionData, Message,
};

use crate::benchmarks::Benchmark;

/// Analyze one conversation's transcript against the ground truth.
pub fn analyze_evolution(
    messages: &[Message],
    ground_truth: &str,
    benchmark: &dyn Benchmark,
) -> EvolutionData {
    let mut answer_history = Vec::new();
    let mut turn = 0u32;

    for message in messages {
        if !message.role.is_agent() {
            continue;
        }
        if let Some(answer) = extract_answer(&message.content) {
            let is_correct = benchmark.evaluate_answer(&answer, ground_truth);
            answer_history.push(AnswerRecord {
                turn,
                agent: message.role,
                answer,
                is_correct,
            });
            turn += 1;
        }
    }

    EvolutionData {
        agreement_pattern: agreement_pattern(&answer_history),
        correctness_pattern: correctness_pattern(&answer_history),
        answer_history,
    }
}

fn agreement_pattern(history: &[AnswerRecord]) -> AgreementPattern {
    if history.len() < 2 {
        return AgreementPattern::InsufficientData;
    }

    let answers_of = |agent: duolog_core::Role| -> Vec<&str> {
        history
            .iter()
            .filter(|r| r.agent == agent)
            .map(|r| r.answer.as_str())
            .collect()
    };
    let agent_a = answers_of(duolog_core::Role::AgentA);
    let agent_b = answers_of(duolog_core::Role::AgentB);

    // One silent agent means agreement cannot be judged
    if agent_a.is_empty() || agent_b.is_empty() {
        return AgreementPattern::InsufficientData;
    }

    let (first_a, first_b) = (agent_a[0], agent_b[0]);
    if first_a == first_b && history.iter().all(|r| r.answer == first_a) {
        return AgreementPattern::CompleteAgreement;
    }

    let (last_a, last_b) = (*agent_a.last().unwrap(), *agent_b.last().unwrap());
    if last_a == last_b {
        let earlier_mismatch = first_a != first_b
            || agent_a[..agent_a.len() - 1]
                .iter()
                .chain(&agent_b[..agent_b.len() - 1])
                .any(|a| *a != last_a);
        return if earlier_mismatch {
            AgreementPattern::ResolvedDisagreement
        } else {
            AgreementPattern::CompleteAgreement
        };
    }

    AgreementPattern::UnresolvedDisagreement
}

fn correctness_pattern(history: &[AnswerRecord]) -> CorrectnessPattern {
    let unified: Vec<bool> = history.iter().map(|r| r.is_correct).collect();
    if unified.is_empty() {
        return CorrectnessPattern::InsufficientData;
    }

    if unified.iter().all(|c| *c) {
        return CorrectnessPattern::StableCorrect;
    }
    if !unified.iter().any(|c| *c) {
        return CorrectnessPattern::StableIncorrect;
    }

    // One agent held the correct answer throughout, the other wavered
    for agent in [duolog_core::Role::AgentA, duolog_core::Role::AgentB] {
        let agent_history: Vec<bool> = history
            .iter()
            .filter(|r| r.agent == agent)
            .map(|r| r.is_correct)
            .collect();
        if !agent_history.is_empty() && agent_history.iter().all(|c| *c) {
            return CorrectnessPattern::StableCorrectOneAgent;
        }
    }

    let (first, last) = (unified[0], *unified.last().unwrap());
    if unified.len() > 1 {
        if !first && last {
            return CorrectnessPattern::Improvement;
        }
        if first && !last {
            return CorrectnessPattern::Deterioration;
        }
    }

    if unified.len() >= 3 {
        let middle = &unified[1..unified.len() - 1];
        if first && last && middle.iter().any(|c| !*c) {
            return CorrectnessPattern::MixedPatternFinalCorrect;
        }
        if !first && !last && middle.iter().any(|c| *c) {
            return CorrectnessPattern::MixedPatternFinalIncorrect;
        }
    }

    CorrectnessPattern::MixedPattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::StaticBenchmark;
    use duolog_core::{AnswerFormat, Role, Variant};

    fn bench() -> StaticBenchmark {
        StaticBenchmark::new("static", "Static", AnswerFormat::Text, vec![])
    }

    fn turn(role: Role, content: &str) -> Message {
        Message::new(role, content, Variant::Dual)
    }

    #[test]
    fn test_complete_agreement_stable_correct() {
        let messages = vec![
            turn(Role::User, "q"),
            turn(Role::AgentA, "Answer: 42"),
            turn(Role::AgentB, "I concur. Answer: 42"),
            turn(Role::AgentA, "Final Answer: 42"),
        ];
        let evolution = analyze_evolution(&messages, "42", &bench());
        assert_eq!(
            evolution.agreement_pattern,
            AgreementPattern::CompleteAgreement
        );
        assert_eq!(
            evolution.correctness_pattern,
            CorrectnessPattern::StableCorrect
        );
        assert_eq!(evolution.answer_history.len(), 3);
        assert_eq!(evolution.answer_history[0].turn, 0);
    }

    #[test]
    fn test_resolved_disagreement_improvement() {
        let messages = vec![
            turn(Role::AgentA, "Answer: 7"),
            turn(Role::AgentB, "No. Answer: 9"),
            turn(Role::AgentA, "Reconsidering. Final Answer: 42"),
            turn(Role::AgentB, "Final Answer: 42"),
        ];
        let evolution = analyze_evolution(&messages, "42", &bench());
        assert_eq!(
            evolution.agreement_pattern,
            AgreementPattern::ResolvedDisagreement
        );
        assert_eq!(
            evolution.correctness_pattern,
            CorrectnessPattern::Improvement
        );
    }

    #[test]
    fn test_unresolved_disagreement() {
        let messages = vec![
            turn(Role::AgentA, "Answer: 42"),
            turn(Role::AgentB, "Answer: 7"),
        ];
        let evolution = analyze_evolution(&messages, "42", &bench());
        assert_eq!(
            evolution.agreement_pattern,
            AgreementPattern::UnresolvedDisagreement
        );
        // Agent A is always correct while B never is
        assert_eq!(
            evolution.correctness_pattern,
            CorrectnessPattern::StableCorrectOneAgent
        );
    }

    #[test]
    fn test_deterioration() {
        let messages = vec![
            turn(Role::AgentA, "Answer: 42"),
            turn(Role::AgentB, "Actually Answer: 41"),
            turn(Role::AgentA, "Conceded. Final Answer: 41"),
        ];
        let evolution = analyze_evolution(&messages, "42", &bench());
        assert_eq!(
            evolution.correctness_pattern,
            CorrectnessPattern::Deterioration
        );
    }

    #[test]
    fn test_mixed_pattern_final_correct() {
        let messages = vec![
            turn(Role::AgentA, "Answer: 42"),
            turn(Role::AgentB, "Answer: 7"),
            turn(Role::AgentA, "Answer: 7"),
            turn(Role::AgentB, "Answer: 42"),
            turn(Role::AgentA, "Final Answer: 42"),
        ];
        let evolution = analyze_evolution(&messages, "42", &bench());
        assert_eq!(
            evolution.correctness_pattern,
            CorrectnessPattern::MixedPatternFinalCorrect
        );
    }

    #[test]
    fn test_insufficient_data() {
        let evolution = analyze_evolution(&[], "42", &bench());
        assert_eq!(
            evolution.agreement_pattern,
            AgreementPattern::InsufficientData
        );
        assert_eq!(
            evolution.correctness_pattern,
            CorrectnessPattern::InsufficientData
        );

        // Only one agent ever answered
        let messages = vec![
            turn(Role::AgentA, "Answer: 1"),
            turn(Role::AgentA, "Answer: 2"),
        ];
        let evolution = analyze_evolution(&messages, "42", &bench());
        assert_eq!(
            evolution.agreement_pattern,
            AgreementPattern::InsufficientData
        );
    }
}
