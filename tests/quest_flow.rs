//! End-to-end behaviour of the quest engine: cache-aside reads, write-back and completion.

mod common;

use std::sync::Arc;

use common::TestApp;
use star_quest_back::{
    dao::{
        game_store::{CollectionStore, CompletionStore, InteractionStore, ProgressStore},
        models::ProgressEntity,
    },
    error::ServiceError,
    services::{
        quest_service::{CompletionRequest, QuestService},
        write_worker::{AsyncWriteWorker, WriteTask},
    },
    state::{
        cache::StateCache,
        stage::{GameStage, InteractiveObjectType, StarType},
    },
};
use uuid::Uuid;

const REQUEST_FORM_ID: u32 = 3;

fn completion() -> CompletionRequest {
    CompletionRequest {
        email: "player@example.com".into(),
        concern: Some("I keep losing my stars.".into()),
        selected_npc: "여우".into(),
    }
}

async fn play_every_star(quest: &QuestService, player: Uuid) {
    for star in StarType::ALL {
        quest.collect_star(player, star).await.unwrap();
        quest.deliver_star(player, star).await.unwrap();
    }
}

#[tokio::test]
async fn cold_reads_hit_the_store_once() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    app.store
        .save_progress(ProgressEntity::new(player, GameStage::CollectLonely))
        .await
        .unwrap();
    let quest = app.state.quest().await.unwrap();

    assert_eq!(quest.current_stage(player).await.unwrap(), GameStage::CollectLonely);
    assert_eq!(quest.current_stage(player).await.unwrap(), GameStage::CollectLonely);
    assert_eq!(app.store.progress_reads(), 1);
}

#[tokio::test]
async fn unknown_player_has_no_progress() {
    let app = TestApp::new().await;
    let quest = app.state.quest().await.unwrap();

    let err = quest.current_stage(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn players_read_their_own_writes_before_write_back() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();
    app.flush().await;

    let view = quest.collect_star(player, StarType::Envy).await.unwrap();
    assert_eq!(view.stage, GameStage::CollectEnvy);
    assert_eq!(quest.current_stage(player).await.unwrap(), GameStage::CollectEnvy);

    let stored = app.store.find_progress(player).await.unwrap().unwrap();
    assert_eq!(stored.current_stage, GameStage::GameStart);

    app.flush().await;
    let stored = app.store.find_progress(player).await.unwrap().unwrap();
    assert_eq!(stored.current_stage, GameStage::CollectEnvy);
    let record = app
        .store
        .find_collection(player, StarType::Envy)
        .await
        .unwrap()
        .unwrap();
    assert!(record.collected && !record.delivered);
    assert!(record.collected_at.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_actions_on_different_stars_keep_every_flag() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();

    let handles: Vec<_> = StarType::ALL
        .into_iter()
        .map(|star| {
            let quest = quest.clone();
            tokio::spawn(async move {
                quest.collect_star(player, star).await?;
                quest.deliver_star(player, star).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = app.state.cache().get(player).unwrap();
    for star in StarType::ALL {
        assert!(state.is_collected(star), "{star:?}");
        assert!(state.is_delivered(star), "{star:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_collects_of_one_star_succeed_once() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let quest = quest.clone();
            tokio::spawn(async move { quest.collect_star(player, StarType::Lonely).await })
        })
        .collect();
    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn completion_sends_exactly_one_letter() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();
    play_every_star(&quest, player).await;
    app.flush().await;

    let view = quest.complete_game(player, completion()).await.unwrap();
    assert_eq!(view.stage, GameStage::GameComplete);
    assert!(app.mailer.sent().is_empty());

    app.flush().await;
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "player@example.com");
    assert_eq!(sent[0].sender, "prettycutyfox@b612.rose.com");

    let err = quest.complete_game(player, completion()).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    app.flush().await;
    assert_eq!(app.mailer.sent().len(), 1);

    let stored = app.store.find_progress(player).await.unwrap().unwrap();
    assert_eq!(stored.current_stage, GameStage::GameComplete);
    let letter = app.store.find_completion(player).await.unwrap().unwrap();
    assert!(letter.delivered);
    assert_eq!(letter.selected_npc, "여우");
    assert_eq!(app.store.completion_writes(), 1);
}

#[tokio::test]
async fn completion_checks_stars_then_email_then_character() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();
    quest.collect_star(player, StarType::Pride).await.unwrap();
    app.flush().await;

    let err = quest.complete_game(player, completion()).await.unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    play_every_star(&quest, player).await;
    app.flush().await;

    let blank_email = CompletionRequest {
        email: " ".into(),
        ..completion()
    };
    let err = quest.complete_game(player, blank_email).await.unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    let no_character = CompletionRequest {
        selected_npc: String::new(),
        ..completion()
    };
    let err = quest.complete_game(player, no_character).await.unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    let stranger = CompletionRequest {
        selected_npc: "여우 아님".into(),
        ..completion()
    };
    let err = quest.complete_game(player, stranger).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    assert_eq!(quest.current_stage(player).await.unwrap(), GameStage::DeliverSad);
}

#[tokio::test]
async fn rejected_letter_keeps_the_game_complete() {
    let app = TestApp::with_mailer(common::RecordingMailer::rejecting()).await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();
    play_every_star(&quest, player).await;
    app.flush().await;

    quest.complete_game(player, completion()).await.unwrap();
    app.flush().await;

    assert_eq!(app.mailer.sent().len(), 1);
    assert_eq!(quest.current_stage(player).await.unwrap(), GameStage::GameComplete);
    let letter = app.store.find_completion(player).await.unwrap().unwrap();
    assert!(!letter.delivered);
    assert_eq!(letter.email, "player@example.com");
    assert!(letter.failure.is_some());
}

#[tokio::test]
async fn request_form_is_activated_once() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();
    app.flush().await;

    let form = app
        .store
        .find_interaction(player, REQUEST_FORM_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(!form.is_active);

    play_every_star(&quest, player).await;
    app.flush().await;
    let writes = app.store.interaction_writes();

    let store = Arc::new(app.store.clone());
    let worker = AsyncWriteWorker::new(store, app.executor.clone(), app.mailer.clone());
    for _ in 0..3 {
        let _ = worker
            .execute(
                player,
                WriteTask::DeliverStar {
                    star: StarType::Sad,
                    stage: GameStage::DeliverSad,
                },
            )
            .await;
    }

    assert_eq!(app.store.interaction_writes(), writes);
    let form = app
        .store
        .find_interaction(player, REQUEST_FORM_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(form.is_active);

    let interactions = app.state.interactions().await.unwrap();
    let status = interactions.open_request_form(player).await.unwrap();
    assert_eq!(status.object_type, InteractiveObjectType::RequestForm);
}

#[tokio::test]
async fn failed_write_back_keeps_the_cached_state() {
    let app = TestApp::new().await;
    let player = Uuid::new_v4();
    let quest = app.state.quest().await.unwrap();
    quest.start_game(player).await.unwrap();
    app.flush().await;

    app.store.set_unavailable(true);
    quest.collect_star(player, StarType::Envy).await.unwrap();
    assert_eq!(app.flush().await, 1);
    assert_eq!(quest.current_stage(player).await.unwrap(), GameStage::CollectEnvy);

    app.store.set_unavailable(false);
    let stored = app.store.find_progress(player).await.unwrap().unwrap();
    assert_eq!(stored.current_stage, GameStage::GameStart);

    quest.collect_star(player, StarType::Lonely).await.unwrap();
    app.flush().await;
    let stored = app.store.find_progress(player).await.unwrap().unwrap();
    assert_eq!(stored.current_stage, GameStage::CollectLonely);
}
