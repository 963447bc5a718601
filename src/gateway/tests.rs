use super::fake::FakeEngine;
use super::http::{parse_body, rejection_message};
use super::*;
use crate::config::EngineSettings;
use crate::model::TrackRef;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Gateway that always answers with the same value.
struct Canned(Value);

#[async_trait]
impl CommandGateway for Canned {
    async fn invoke(&self, _command: Command) -> Result<Value, EngineError> {
        Ok(self.0.clone())
    }
}

#[test]
fn command_names_match_the_engine_surface() {
    assert_eq!(Command::GetCurrentTrack.name(), "get_current_track");
    assert_eq!(
        Command::PlayMusic {
            path: TrackRef::new("/a.mp3")
        }
        .name(),
        "play_music"
    );
    assert_eq!(Command::GetPlaybackPosition.name(), "get_playback_position");
    assert_eq!(Command::RemoveFolder { folder_id: 3 }.name(), "remove_folder");
}

#[test]
fn command_args_use_camel_case_keys() {
    assert_eq!(
        Command::PlayMusic {
            path: TrackRef::new("/music/a.mp3")
        }
        .args(),
        json!({ "path": "/music/a.mp3" })
    );
    assert_eq!(
        Command::Seek { position_secs: 12.5 }.args(),
        json!({ "positionSecs": 12.5 })
    );
    assert_eq!(
        Command::RemoveFolder { folder_id: 7 }.args(),
        json!({ "folderId": 7 })
    );
    assert_eq!(Command::PauseMusic.args(), json!({}));
}

#[test]
fn endpoint_tolerates_trailing_slash_in_base_url() {
    let settings = EngineSettings {
        base_url: "http://localhost:9000/".into(),
        request_timeout_ms: 100,
    };
    let gw = HttpGateway::new(&settings).unwrap();
    assert_eq!(gw.endpoint("is_playing"), "http://localhost:9000/invoke/is_playing");
}

#[test]
fn rejection_message_prefers_error_field_then_text() {
    let s = StatusCode::BAD_REQUEST;
    assert_eq!(rejection_message(s, r#"{"error":"file unreadable"}"#), "file unreadable");
    assert_eq!(rejection_message(s, r#""out of range""#), "out of range");
    assert_eq!(rejection_message(s, "plain failure"), "plain failure");
    assert_eq!(rejection_message(s, ""), "Bad Request");
    assert_eq!(rejection_message(s, r#"{"other":1}"#), "Bad Request");
}

#[test]
fn empty_body_is_an_acknowledgement() {
    assert_eq!(parse_body("pause_music", "").unwrap(), Value::Null);
    assert_eq!(parse_body("is_playing", "true").unwrap(), json!(true));
    assert!(matches!(
        parse_body("is_playing", "{nope"),
        Err(EngineError::Unavailable(_))
    ));
}

#[tokio::test]
async fn engine_decodes_position_pair() {
    let (fake, engine) = FakeEngine::engine();
    fake.set_position(61.5, Some(180.0));
    let (elapsed, total) = engine.playback_position().await.unwrap();
    assert_eq!(elapsed, Duration::from_millis(61_500));
    assert_eq!(total, Some(Duration::from_secs(180)));

    fake.set_position(3.0, None);
    let (_, total) = engine.playback_position().await.unwrap();
    assert_eq!(total, None);
}

#[tokio::test]
async fn engine_decodes_current_track_and_library() {
    let (fake, engine) = FakeEngine::engine();
    assert_eq!(engine.current_track().await.unwrap(), None);

    fake.with_library(&["/music/a.mp3", "/music/b.mp3"]);
    fake.set_current(Some("/music/b.mp3"));
    assert_eq!(
        engine.current_track().await.unwrap(),
        Some(TrackRef::new("/music/b.mp3"))
    );
    let info = engine.current_track_info().await.unwrap().unwrap();
    assert_eq!(info.path.as_str(), "/music/b.mp3");

    let tracks = engine.list_music().await.unwrap();
    assert_eq!(tracks.len(), 2);
}

#[tokio::test]
async fn malformed_response_is_unavailable() {
    let engine = Engine::new(Arc::new(Canned(json!("not a bool"))));
    let err = engine.is_playing().await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn acknowledgements_ignore_the_response_body() {
    let engine = Engine::new(Arc::new(Canned(json!([{"path": "/x.mp3"}]))));
    engine.index_folder("/music").await.unwrap();
    engine.load_from_db().await.unwrap();
}

#[tokio::test]
async fn rejected_commands_carry_the_command_name() {
    let (fake, engine) = FakeEngine::engine();
    fake.fail("seek", "out of range");
    let err = engine.seek(Duration::from_secs(999)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Rejected {
            command: "seek",
            message: "out of range".into()
        }
    );
    assert_eq!(err.reason(), "out of range");
    assert_eq!(fake.calls("seek"), 1);
}
