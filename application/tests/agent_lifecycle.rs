//! Integration tests for agent memory and lifecycle

mod common;

use common::loaded;
use playpen_application::{Agent, AgentError, GenerationEngine};
use playpen_domain::{GenerationConfig, Message};
use std::sync::Arc;

fn agent(context_size: usize) -> Agent {
    let (model, _) = loaded("move", context_size);
    Agent::new(
        "player",
        GenerationConfig::default(),
        Arc::new(GenerationEngine::new(model)),
    )
}

#[test]
fn test_observe_keeps_call_order() {
    let mut agent = agent(4096);
    agent.observe(Message::system("rules")).unwrap();
    agent.observe(Message::user("first")).unwrap();
    agent.observe(Message::user("second")).unwrap();

    let contents: Vec<&str> = agent.memory().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["rules", "first", "second"]);
}

#[test]
fn test_act_does_not_clear_memory() {
    let mut agent = agent(4096);
    agent.observe(Message::user("Guess a word")).unwrap();

    let output = agent.act().unwrap();
    assert!(output.text.starts_with("move"));
    assert_eq!(agent.memory().len(), 1);

    agent.observe(Message::assistant(output.text)).unwrap();
    agent.observe(Message::user("Wrong, try again")).unwrap();
    let second = agent.act().unwrap();
    assert_eq!(agent.memory().len(), 3);
    assert!(second.prompt.inputs.contains("Guess a word"));
    assert!(second.prompt.inputs.contains("Wrong, try again"));
}

#[test]
fn test_failed_turn_leaves_memory_untouched() {
    let mut agent = agent(16);
    agent.observe(Message::user("this prompt is far too long")).unwrap();
    let before = agent.memory().to_vec();

    let err = agent.act().unwrap_err();

    assert!(err.is_context_exceeded());
    assert_eq!(agent.memory(), before.as_slice());
}

#[test]
fn test_act_after_shutdown_is_lifecycle_error() {
    let mut agent = agent(4096);
    agent.observe(Message::user("hi")).unwrap();
    agent.shutdown().unwrap();
    assert!(!agent.is_active());

    let err = agent.act().unwrap_err();
    assert!(matches!(err, AgentError::Lifecycle { operation: "act", .. }));
    assert_eq!(agent.memory(), &[Message::user("hi")]);
}

#[test]
fn test_observe_after_shutdown_is_lifecycle_error() {
    let mut agent = agent(4096);
    agent.shutdown().unwrap();

    let err = agent.observe(Message::user("late")).unwrap_err();
    assert!(matches!(err, AgentError::Lifecycle { .. }));
    assert!(agent.memory().is_empty());
}

#[test]
fn test_second_shutdown_is_lifecycle_error() {
    let mut agent = agent(4096);
    agent.shutdown().unwrap();
    assert!(agent.shutdown().is_err());
}

#[test]
fn test_replicate_shares_engine_with_fresh_memory() {
    let mut original = agent(4096);
    original.observe(Message::user("hi")).unwrap();

    let copy = original.replicate().unwrap();

    assert!(copy.shares_engine_with(&original));
    assert!(copy.memory().is_empty());
    assert_eq!(copy.name(), original.name());
    assert_eq!(copy.generation_config(), original.generation_config());
}

#[test]
fn test_replicate_after_shutdown_fails() {
    let mut original = agent(4096);
    original.shutdown().unwrap();
    assert!(original.replicate().is_err());
}
