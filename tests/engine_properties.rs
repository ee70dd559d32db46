//! Property tests for session and log invariants.

use proptest::prelude::*;
use serde_json::Map;

use rental_assistant::domain::conversation::{
    dispatch, FlowType, InputType, MessageLog, ResultItem, Session, SessionStatus, StepOutcome,
    StepUpdate, Turn, TurnFlags,
};
use rental_assistant::domain::foundation::DialogueSessionId;

fn input_type() -> impl Strategy<Value = InputType> {
    prop_oneof![
        Just(InputType::FreeText),
        Just(InputType::Choice),
        Just(InputType::Email),
        Just(InputType::Phone),
        Just(InputType::StructuredResults),
        Just(InputType::NoResults),
        Just(InputType::Info),
        Just(InputType::TerminalChoicePrompt),
        Just(InputType::TerminalMessage),
        Just(InputType::TerminalCompletion),
        Just(InputType::Default),
    ]
}

fn bot_turn() -> impl Strategy<Value = Turn> {
    (
        0u32..20,
        input_type(),
        proptest::option::of("[a-z ]{0,12}"),
        proptest::option::of(proptest::collection::vec("[A-Z][a-z]{1,6}", 0..4)),
        proptest::collection::vec("[0-9]{1,3}", 0..3),
    )
        .prop_map(|(step, input_type, content, options, ids)| {
            let items = ids
                .into_iter()
                .map(|id| ResultItem::new(id, Map::new()))
                .collect::<Result<Vec<_>, _>>()
                .ok()
                .filter(|items| !items.is_empty());
            Turn::bot(step, input_type, content)
                .with_options(options)
                .with_items(items)
        })
}

fn flags() -> impl Strategy<Value = TurnFlags> {
    (
        proptest::bool::weighted(0.1),
        proptest::bool::weighted(0.05),
        proptest::bool::weighted(0.15),
    )
        .prop_map(|(is_final, conversation_completed, restart)| TurnFlags {
            is_final,
            conversation_completed,
            restart,
            ..Default::default()
        })
}

fn step_update() -> impl Strategy<Value = StepUpdate> {
    (
        proptest::option::of(0u32..50),
        proptest::option::of("[a-z_]{1,10}"),
        flags(),
    )
        .prop_map(|(step_number, flow, flags)| StepUpdate {
            step_number,
            flow_type: flow.and_then(FlowType::parse),
            flags,
        })
}

fn session() -> Session {
    Session::start(DialogueSessionId::new("abc").unwrap())
}

proptest! {
    #[test]
    fn step_is_monotonic_unless_restarted(updates in proptest::collection::vec(step_update(), 1..30)) {
        let mut session = session();

        for update in &updates {
            let was_active = session.is_active();
            let previous = session.current_step();
            let result = session.apply_step(update);

            if !was_active {
                prop_assert!(result.is_err());
                prop_assert_eq!(session.current_step(), previous);
            } else if update.flags.restart {
                prop_assert_eq!(result, Ok(StepOutcome::Restarted));
                prop_assert_eq!(session.current_step(), 0);
                prop_assert_eq!(session.status(), SessionStatus::Active);
            } else {
                prop_assert!(session.current_step() >= previous);
                let expected = if update.flags.ends_session() {
                    SessionStatus::Completed
                } else {
                    SessionStatus::Active
                };
                prop_assert_eq!(session.status(), expected);
            }
        }
    }

    #[test]
    fn restart_wins_over_completion(step in proptest::option::of(0u32..50), start in 0u32..50) {
        let mut session = session();
        session
            .apply_step(&StepUpdate { step_number: Some(start), ..Default::default() })
            .unwrap();

        let outcome = session.apply_step(&StepUpdate {
            step_number: step,
            flags: TurnFlags {
                is_final: true,
                conversation_completed: true,
                restart: true,
                ..Default::default()
            },
            ..Default::default()
        });

        prop_assert_eq!(outcome, Ok(StepOutcome::Restarted));
        prop_assert_eq!(session.current_step(), 0);
        prop_assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn completed_session_rejects_further_steps(update in step_update()) {
        let mut session = session();
        session
            .apply_step(&StepUpdate {
                step_number: Some(3),
                flags: TurnFlags { is_final: true, ..Default::default() },
                ..Default::default()
            })
            .unwrap();

        prop_assert!(session.apply_step(&update).is_err());
        prop_assert_eq!(session.status(), SessionStatus::Completed);
        prop_assert_eq!(session.current_step(), 3);
    }

    #[test]
    fn log_only_grows(turns in proptest::collection::vec(bot_turn(), 0..20)) {
        let mut log = MessageLog::new();
        let mut seen = Vec::new();

        for turn in turns {
            log.append(turn.clone());
            seen.push(turn);
            prop_assert_eq!(log.len(), seen.len());
            prop_assert_eq!(log.turns(), seen.as_slice());
        }
    }

    #[test]
    fn dispatch_is_deterministic(turn in bot_turn()) {
        prop_assert_eq!(dispatch(&turn), dispatch(&turn.clone()));
    }

    #[test]
    fn terminal_input_types_never_accept_input(turn in bot_turn()) {
        if turn.input_type().is_terminal() {
            prop_assert!(!dispatch(&turn).accepts_input());
        }
    }
}
