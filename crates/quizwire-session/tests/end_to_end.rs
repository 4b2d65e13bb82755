//! Full-session test: two players, two questions, both runtimes wired
//! over the in-process bus, exactly as a single-process deployment runs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use quizwire_bank::{Question, QuestionBank};
use quizwire_protocol::{
    AnswerMessage, Channel, ChannelTransport, ControlMessage, Envelope, InProcessBus,
    QuestionMessage,
};
use quizwire_session::{
    ArchiveMirror, HostCommand, HostRuntime, Orchestrator, PlayerCommand, PlayerRuntime,
    PlayerSession,
};
use quizwire_test_support::{RecordingArchive, SequenceRng, SteppingClock};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Waits (bounded) until the subscription yields an envelope the predicate
/// accepts, returning the mapped value.
async fn expect_message<T>(
    rx: &mut UnboundedReceiver<Envelope>,
    mut pred: impl FnMut(&Envelope) -> Option<T>,
) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let envelope = rx.recv().await.expect("bus closed unexpectedly");
            if let Some(value) = pred(&envelope) {
                return value;
            }
        }
    })
    .await
    .expect("timed out waiting for a message")
}

/// Lets in-flight bus deliveries land on every subscriber.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

fn answer_result_for(envelope: &Envelope, player: Uuid) -> Option<AnswerMessage> {
    if envelope.channel != Channel::Answers {
        return None;
    }
    match serde_json::from_value(envelope.payload.clone()) {
        Ok(AnswerMessage::AnswerResult { player_uuid, .. }) if player_uuid == player => {
            serde_json::from_value(envelope.payload.clone()).ok()
        }
        _ => None,
    }
}

#[tokio::test]
async fn test_two_player_session_end_to_end() {
    let bank = QuestionBank::new(vec![
        Question {
            id: 1,
            text: "first question".to_owned(),
            options: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            correct_index: 1,
            explanation: "first explanation".to_owned(),
        },
        Question {
            id: 2,
            text: "second question".to_owned(),
            options: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            correct_index: 0,
            explanation: "second explanation".to_owned(),
        },
    ])
    .unwrap();

    let bus = Arc::new(InProcessBus::default());
    let archive = Arc::new(RecordingArchive::new());
    let start = Utc.with_ymd_and_hms(2026, 2, 1, 19, 0, 0).unwrap();

    // Host: draws questions in catalog order.
    let orchestrator = Orchestrator::new(
        bank,
        bus.clone(),
        ArchiveMirror::spawn(archive.clone()),
        Arc::new(SteppingClock::new(start, chrono::Duration::milliseconds(10))),
        Box::new(SequenceRng::new(vec![0, 0])),
    );
    let (host_runtime, host) = HostRuntime::new(orchestrator, bus.as_ref());
    let host_task = tokio::spawn(host_runtime.run());

    // Players: each clock tick is one observation, so Alice's answers
    // always measure 1.2s and Bob's 2.0s.
    let alice_uuid = Uuid::new_v4();
    let bob_uuid = Uuid::new_v4();
    let alice = PlayerSession::new(
        alice_uuid,
        "Alice",
        bus.clone(),
        Arc::new(SteppingClock::new(start, chrono::Duration::milliseconds(1200))),
    );
    let bob = PlayerSession::new(
        bob_uuid,
        "Bob",
        bus.clone(),
        Arc::new(SteppingClock::new(start, chrono::Duration::milliseconds(2000))),
    );
    let (alice_runtime, alice_cmd) = PlayerRuntime::new(alice, bus.as_ref());
    let (bob_runtime, bob_cmd) = PlayerRuntime::new(bob, bus.as_ref());
    let alice_task = tokio::spawn(alice_runtime.run());
    let bob_task = tokio::spawn(bob_runtime.run());

    // The test watches the wire like any other subscriber.
    let mut wire = bus.subscribe(&Channel::ALL);

    alice_cmd.send(PlayerCommand::Join).unwrap();
    bob_cmd.send(PlayerCommand::Join).unwrap();
    settle().await;

    host.send(HostCommand::Configure { question_count: 2 }).unwrap();
    expect_message(&mut wire, |e| {
        (e.channel == Channel::GameControl
            && matches!(
                serde_json::from_value(e.payload.clone()),
                Ok(ControlMessage::QuizStarted { .. })
            ))
        .then_some(())
    })
    .await;
    settle().await;

    // --- Question 1: Alice first correct, Bob correct but slower ---

    host.send(HostCommand::AskNext).unwrap();
    let first_question = expect_message(&mut wire, |e| {
        (e.channel == Channel::Questions)
            .then(|| serde_json::from_value::<QuestionMessage>(e.payload.clone()).ok())
            .flatten()
    })
    .await;
    let QuestionMessage::QuestionAsked { question, question_number, .. } = first_question;
    assert_eq!(question.id, 1);
    assert_eq!(question_number, 1);
    settle().await;

    alice_cmd
        .send(PlayerCommand::SelectAnswer { answer_index: 1 })
        .unwrap();
    let alice_verdict = expect_message(&mut wire, |e| answer_result_for(e, alice_uuid)).await;
    let AnswerMessage::AnswerResult {
        is_correct,
        was_fastest,
        feedback,
        response_time,
        ..
    } = alice_verdict
    else {
        unreachable!();
    };
    assert!(is_correct && was_fastest);
    assert_eq!(feedback, "Right, and fastest!");
    assert!((response_time - 1.2).abs() < 1e-9);

    bob_cmd
        .send(PlayerCommand::SelectAnswer { answer_index: 1 })
        .unwrap();
    let bob_verdict = expect_message(&mut wire, |e| answer_result_for(e, bob_uuid)).await;
    let AnswerMessage::AnswerResult {
        is_correct,
        was_fastest,
        feedback,
        ..
    } = bob_verdict
    else {
        unreachable!();
    };
    assert!(is_correct && !was_fastest);
    assert_eq!(feedback, "Right, but not fastest");

    host.send(HostCommand::CloseQuestion).unwrap();
    settle().await;

    // --- Question 2: Alice wrong, Bob silent ---

    host.send(HostCommand::AskNext).unwrap();
    let second_question = expect_message(&mut wire, |e| {
        (e.channel == Channel::Questions)
            .then(|| serde_json::from_value::<QuestionMessage>(e.payload.clone()).ok())
            .flatten()
    })
    .await;
    let QuestionMessage::QuestionAsked { question, question_number, .. } = second_question;
    assert_eq!(question.id, 2);
    assert_eq!(question_number, 2);
    settle().await;

    alice_cmd
        .send(PlayerCommand::SelectAnswer { answer_index: 2 })
        .unwrap();
    let alice_verdict = expect_message(&mut wire, |e| answer_result_for(e, alice_uuid)).await;
    let AnswerMessage::AnswerResult { is_correct, feedback, .. } = alice_verdict else {
        unreachable!();
    };
    assert!(!is_correct);
    assert_eq!(feedback, "Wrong");

    host.send(HostCommand::CloseQuestion).unwrap();
    let bob_verdict = expect_message(&mut wire, |e| answer_result_for(e, bob_uuid)).await;
    let AnswerMessage::AnswerResult {
        is_correct,
        feedback,
        correct_answer_index,
        ..
    } = bob_verdict
    else {
        unreachable!();
    };
    assert!(!is_correct);
    assert_eq!(feedback, "No answer submitted");
    assert_eq!(correct_answer_index, 0);

    // --- Completion: asking past the configured count finishes the session ---

    host.send(HostCommand::AskNext).unwrap();
    let (standings, winner) = expect_message(&mut wire, |e| {
        if e.channel != Channel::GameControl {
            return None;
        }
        match serde_json::from_value(e.payload.clone()) {
            Ok(ControlMessage::QuizResults { results, winner, .. }) => Some((results, winner)),
            _ => None,
        }
    })
    .await;

    assert_eq!(standings.len(), 2);
    assert_eq!(standings[0].player_uuid, alice_uuid);
    assert_eq!(standings[0].total_points, 3);
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[1].player_uuid, bob_uuid);
    assert_eq!(standings[1].total_points, 1);
    assert_eq!(standings[1].rank, 2);
    let winner = winner.expect("a winner is named");
    assert_eq!(winner.player_uuid, alice_uuid);
    assert_eq!(winner.total_points, 3);
    settle().await;

    // --- Shut down and inspect the returned state machines ---

    host.send(HostCommand::Shutdown).unwrap();
    alice_cmd.send(PlayerCommand::Shutdown).unwrap();
    bob_cmd.send(PlayerCommand::Shutdown).unwrap();

    let orchestrator = host_task.await.unwrap();
    let alice = alice_task.await.unwrap();
    let bob = bob_task.await.unwrap();

    assert_eq!(
        orchestrator.phase(),
        quizwire_session::SessionPhase::Completed
    );
    assert_eq!(alice.stats().total_points, 3);
    assert_eq!(alice.stats().questions_answered, 2);
    assert_eq!(bob.stats().total_points, 1);
    assert_eq!(bob.stats().questions_answered, 1);
    assert_eq!(alice.phase(), quizwire_session::PlayerPhase::Completed);
    assert_eq!(
        alice.session_results().unwrap().standings[0].player_name,
        "Alice"
    );
}

#[tokio::test]
async fn test_late_joiner_recovers_the_open_question() {
    let bank = QuestionBank::new(vec![Question {
        id: 1,
        text: "only question".to_owned(),
        options: vec!["a".to_owned(), "b".to_owned()],
        correct_index: 0,
        explanation: "why".to_owned(),
    }])
    .unwrap();

    let bus = Arc::new(InProcessBus::default());
    let start = Utc.with_ymd_and_hms(2026, 2, 1, 19, 0, 0).unwrap();
    let orchestrator = Orchestrator::new(
        bank,
        bus.clone(),
        ArchiveMirror::disconnected(),
        Arc::new(SteppingClock::new(start, chrono::Duration::milliseconds(10))),
        Box::new(SequenceRng::new(vec![0])),
    );
    let (host_runtime, host) = HostRuntime::new(orchestrator, bus.as_ref());
    let host_task = tokio::spawn(host_runtime.run());

    // An early player joins before the session starts.
    let early = PlayerSession::new(
        Uuid::new_v4(),
        "Early",
        bus.clone(),
        Arc::new(SteppingClock::new(start, chrono::Duration::milliseconds(500))),
    );
    let (early_runtime, early_cmd) = PlayerRuntime::new(early, bus.as_ref());
    let early_task = tokio::spawn(early_runtime.run());
    early_cmd.send(PlayerCommand::Join).unwrap();
    settle().await;

    host.send(HostCommand::Configure { question_count: 1 }).unwrap();
    settle().await;
    host.send(HostCommand::AskNext).unwrap();
    settle().await;

    // A second player joins while question 1 is open; the join flow
    // requests state and receives the targeted re-send.
    let late_uuid = Uuid::new_v4();
    let late = PlayerSession::new(
        late_uuid,
        "Late",
        bus.clone(),
        Arc::new(SteppingClock::new(start, chrono::Duration::milliseconds(700))),
    );
    let (late_runtime, late_cmd) = PlayerRuntime::new(late, bus.as_ref());
    let late_task = tokio::spawn(late_runtime.run());

    let mut wire = bus.subscribe(&[Channel::Questions]);
    late_cmd.send(PlayerCommand::Join).unwrap();

    let targeted = expect_message(&mut wire, |e| {
        match serde_json::from_value(e.payload.clone()) {
            Ok(QuestionMessage::QuestionAsked {
                question,
                question_number,
                target_player: Some(target),
                ..
            }) if target == late_uuid => Some((question, question_number)),
            _ => None,
        }
    })
    .await;
    assert_eq!(targeted.0.id, 1);
    assert_eq!(targeted.1, 1);
    settle().await;

    // The late joiner can answer the in-progress question like anyone else.
    let mut answers = bus.subscribe(&[Channel::Answers]);
    late_cmd
        .send(PlayerCommand::SelectAnswer { answer_index: 0 })
        .unwrap();
    let verdict = expect_message(&mut answers, |e| answer_result_for(e, late_uuid)).await;
    let AnswerMessage::AnswerResult { is_correct, .. } = verdict else {
        unreachable!();
    };
    assert!(is_correct);
    settle().await;

    host.send(HostCommand::Shutdown).unwrap();
    early_cmd.send(PlayerCommand::Shutdown).unwrap();
    late_cmd.send(PlayerCommand::Shutdown).unwrap();
    host_task.await.unwrap();
    early_task.await.unwrap();

    let late = late_task.await.unwrap();
    assert!(late.joined_mid_session());
    assert_eq!(late.stats().questions_answered, 1);
}
