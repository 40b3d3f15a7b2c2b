//! Orchestrator integration tests
//!
//! Cover dispatch per modality, the tool loop, and release of temporary
//! assets on every exit path.

mod helpers;

use helpers::*;
use pantry_ai::inference::{
    last_tool_result, ChatMessage, FakeCall, FakeInference, InferenceError, ReasonerStep, ScriptedReasoner,
    ToolCall,
};
use pantry_ai::orchestrator::{Modality, OrchestrationError, RequestEnvelope};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn envelope(modality: Modality, payload: &str) -> RequestEnvelope {
    RequestEnvelope {
        modality,
        payload: payload.to_string(),
        user_id: "42".to_string(),
    }
}

fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn tool_outputs(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            ChatMessage::Tool { content, .. } => serde_json::from_str(content).ok(),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_audio_request_end_to_end() {
    let seen_path: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let seen = seen_path.clone();

    let reasoner = ScriptedReasoner::new()
        .then(move |messages| {
            let path = task_asset_path(messages).expect("task names the audio file");
            assert!(path.ends_with(".wav"));
            assert!(std::path::Path::new(&path).exists());
            *seen.lock().unwrap() = Some(PathBuf::from(&path));
            Ok(ReasonerStep::ToolCalls(vec![tool_call(
                "call_voice",
                "voice_processor",
                json!({"voice_data_file_path": path}),
            )]))
        })
        .then(|messages| {
            let transcript = last_tool_result(messages).unwrap();
            assert_eq!(transcript["text"], "two eggs and a cup of flour");
            Ok(ReasonerStep::ToolCalls(vec![tool_call(
                "call_recipe",
                "insert_recipe",
                json!({
                    "title": "Simple crepes",
                    "recipe_metadata": {"tags": ["breakfast"], "calories": 320},
                    "source_type": "audio",
                    "source_data": "two eggs and a cup of flour"
                }),
            )]))
        })
        .then(|messages| {
            let recipe = last_tool_result(messages).unwrap();
            let recipe_id = recipe["id"].as_i64().unwrap();
            Ok(ReasonerStep::ToolCalls(vec![
                tool_call(
                    "call_egg",
                    "insert_recipe_ingredient",
                    json!({"recipe_id": recipe_id, "name": "eggs", "quantity": "2", "unit": ""}),
                ),
                tool_call(
                    "call_flour",
                    "insert_recipe_ingredient",
                    json!({"recipe_id": recipe_id, "name": "flour", "quantity": "1", "unit": "cup"}),
                ),
            ]))
        })
        .then_final("Saved Simple crepes with 2 ingredients");

    let h = harness(
        FakeInference::new().with_transcript("two eggs and a cup of flour"),
        reasoner,
    )
    .await;

    let outcome = h
        .orchestrator
        .run(envelope(Modality::Audio, &wav_base64()))
        .await
        .unwrap();

    assert_eq!(outcome.output, "Saved Simple crepes with 2 ingredients");
    let names: Vec<&str> = outcome.tool_calls.iter().map(|c| c.tool.as_str()).collect();
    assert_eq!(
        names,
        vec!["voice_processor", "insert_recipe", "insert_recipe_ingredient", "insert_recipe_ingredient"]
    );
    assert!(outcome.tool_calls.iter().all(|c| c.success));

    // Stored for the requesting user
    let ingredients: Vec<(String, String)> = sqlx::query_as(
        "SELECT i.name, r.user_id FROM recipe_ingredients i JOIN recipes r ON r.id = i.recipe_id ORDER BY i.id",
    )
    .fetch_all(&h.db)
    .await
    .unwrap();
    assert_eq!(
        ingredients,
        vec![
            ("eggs".to_string(), "42".to_string()),
            ("flour".to_string(), "42".to_string())
        ]
    );

    // Temp file gone, asset released exactly once
    let path = seen_path.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
    assert_eq!(h.assets.outstanding(), 0);
    assert!(h.temp_files().is_empty());

    assert!(matches!(&h.inference.calls()[0], FakeCall::Audio { prompt, .. } if prompt == "Cooking ingredients and quantities."));
}

#[tokio::test]
async fn test_text_request_never_materializes_asset() {
    let h_assets: Arc<Mutex<Option<pantry_ai::assets::TempAssetManager>>> = Arc::new(Mutex::new(None));
    let probe = h_assets.clone();

    let reasoner = ScriptedReasoner::new().then(move |messages| {
        let task = task_text(messages);
        assert_eq!(
            task,
            "The user 42 is trying to generate a recipe providing the following ingredients or data: rice, beans"
        );
        if let Some(assets) = probe.lock().unwrap().as_ref() {
            assert_eq!(assets.outstanding(), 0);
        }
        Ok(ReasonerStep::Final("Rice and beans".to_string()))
    });

    let h = harness(FakeInference::new(), reasoner).await;
    *h_assets.lock().unwrap() = Some(h.assets.clone());

    let outcome = h
        .orchestrator
        .run(envelope(Modality::Text, "rice, beans"))
        .await
        .unwrap();

    assert_eq!(outcome.output, "Rice and beans");
    assert!(outcome.tool_calls.is_empty());
    assert!(h.temp_files().is_empty());
    assert_eq!(h.assets.outstanding(), 0);

    // System instructions precede the task
    let conversation = &h.reasoner.conversations()[0];
    assert!(matches!(&conversation[0], ChatMessage::System { content } if content == "You are the pantry orchestrator."));
}

#[tokio::test]
async fn test_asset_released_when_reasoner_fails() {
    for modality in [Modality::Image, Modality::Audio] {
        let reasoner = ScriptedReasoner::new().then_fail("provider down");
        let h = harness(FakeInference::new(), reasoner).await;

        let payload = match modality {
            Modality::Image => png_base64(),
            _ => wav_base64(),
        };
        let result = h.orchestrator.run(envelope(modality, &payload)).await;

        assert!(matches!(
            result,
            Err(OrchestrationError::Inference(InferenceError::RequestFailed(_)))
        ));
        assert!(h.temp_files().is_empty(), "{} asset left behind", modality);
        assert_eq!(h.assets.outstanding(), 0);
    }
}

#[tokio::test]
async fn test_iteration_limit_enforced_and_asset_released() {
    let mut reasoner = ScriptedReasoner::new();
    for _ in 0..10 {
        reasoner = reasoner.then_tool("get_all_table_schemas", json!({}));
    }
    let h = harness_with_limit(FakeInference::new(), reasoner, 3).await;

    let result = h.orchestrator.run(envelope(Modality::Image, &png_base64())).await;

    assert!(matches!(result, Err(OrchestrationError::IterationLimit(3))));
    assert_eq!(h.reasoner.remaining(), 7);
    assert!(h.temp_files().is_empty());
    assert_eq!(h.assets.outstanding(), 0);
}

#[tokio::test]
async fn test_image_request_reads_image() {
    let reasoner = ScriptedReasoner::new()
        .then(|messages| {
            let path = task_asset_path(messages).unwrap();
            assert!(path.ends_with(".jpg"));
            Ok(ReasonerStep::ToolCalls(vec![tool_call(
                "call_1",
                "image_reader",
                json!({"image_path": path}),
            )]))
        })
        .then(|messages| {
            let result = last_tool_result(messages).unwrap();
            Ok(ReasonerStep::Final(format!("Found: {}", result["text"].as_str().unwrap())))
        });

    let h = harness(FakeInference::new().with_image_description("3 tomatoes, 1 onion"), reasoner).await;

    let outcome = h
        .orchestrator
        .run(envelope(Modality::Image, &png_base64()))
        .await
        .unwrap();

    assert_eq!(outcome.output, "Found: 3 tomatoes, 1 onion");
    match &h.inference.calls()[0] {
        FakeCall::Image { data_uri, .. } => assert!(data_uri.starts_with("data:image/png;base64,")),
        other => panic!("unexpected call {:?}", other),
    }
    assert!(h.temp_files().is_empty());
}

#[tokio::test]
async fn test_tool_failures_fed_back_to_reasoner() {
    let reasoner = ScriptedReasoner::new()
        .then_tool("image_reader", json!({"image_path": "/etc/hostname"}))
        .then_tool("insert_recipe_ingredient", json!({"recipe_id": 999, "name": "salt", "quantity": "1", "unit": "pinch"}))
        .then_tool("no_such_tool", json!({}))
        .then(|messages| {
            let outputs = tool_outputs(messages);
            assert_eq!(outputs.len(), 3);
            assert!(outputs.iter().all(|o| o["status"] == "error"));
            Ok(ReasonerStep::Final("Could not save".to_string()))
        });

    let h = harness(FakeInference::new().with_image_description("x"), reasoner).await;

    let outcome = h
        .orchestrator
        .run(envelope(Modality::Text, "salt"))
        .await
        .unwrap();

    assert_eq!(outcome.tool_calls.len(), 3);
    assert!(outcome.tool_calls.iter().all(|c| !c.success));
    // Foreign path never reached the provider
    assert!(h.inference.calls().is_empty());
}

#[tokio::test]
async fn test_recipe_instructions_then_steps_persisted() {
    let reasoner = ScriptedReasoner::new()
        .then_tool(
            "recipe_instructions_processor",
            json!({"recipe_description": "tomato soup"}),
        )
        .then(|messages| {
            let steps = last_tool_result(messages).unwrap();
            Ok(ReasonerStep::ToolCalls(vec![tool_call(
                "call_insert",
                "insert_recipe",
                json!({
                    "title": "Tomato soup",
                    "source_type": "text",
                    "source_data": "tomatoes",
                    "ingredients": [{"name": "tomatoes", "quantity": "6", "unit": ""}],
                    "steps": steps["instructions"]
                }),
            )]))
        })
        .then_final("Tomato soup saved");

    let h = harness(
        FakeInference::new().with_text("1. Chop tomatoes\n2. Simmer 20 minutes\n3. Blend"),
        reasoner,
    )
    .await;

    h.orchestrator
        .run(envelope(Modality::Text, "tomatoes"))
        .await
        .unwrap();

    let recipes = pantry_ai::db::recipes::load_complete_recipes(&h.db, "42").await.unwrap();
    assert_eq!(recipes.len(), 1);
    let steps = &recipes[0].steps[0].instructions;
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].instruction, "Chop tomatoes");
    assert_eq!(steps[2].step_number, 3);
}

#[tokio::test]
async fn test_invalid_inputs_rejected_before_reasoning() {
    let h = harness(FakeInference::new(), ScriptedReasoner::new().then_final("unused")).await;

    let empty = h.orchestrator.run(envelope(Modality::Text, "   ")).await;
    assert!(matches!(empty, Err(OrchestrationError::InvalidInput(_))));

    let bad_audio = h.orchestrator.run(envelope(Modality::Audio, "%%% not base64")).await;
    assert!(matches!(bad_audio, Err(OrchestrationError::Resource(_))));

    assert_eq!(h.reasoner.remaining(), 1);
    assert!(h.temp_files().is_empty());
}

#[tokio::test]
async fn test_empty_final_answer_is_error() {
    let h = harness(FakeInference::new(), ScriptedReasoner::new().then_final("  ")).await;

    let result = h.orchestrator.run(envelope(Modality::Text, "bread")).await;
    assert!(matches!(
        result,
        Err(OrchestrationError::Inference(InferenceError::EmptyOutput(_)))
    ));
}

#[tokio::test]
async fn test_tools_only_touch_the_requests_own_asset() {
    let h_assets: Arc<Mutex<Option<pantry_ai::assets::TempAssetManager>>> = Arc::new(Mutex::new(None));
    let other_path: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let (probe, other) = (h_assets.clone(), other_path.clone());

    // Another in-flight request's audio, in the same directory with the same prefix
    let reasoner = ScriptedReasoner::new()
        .then(move |_| {
            let path = other.lock().unwrap().clone().unwrap();
            assert!(probe.lock().unwrap().as_ref().unwrap().owns(&path));
            Ok(ReasonerStep::ToolCalls(vec![tool_call(
                "call_other",
                "voice_processor",
                json!({"voice_data_file_path": path}),
            )]))
        })
        .then(|messages| {
            assert_eq!(last_tool_result(messages).unwrap()["status"], "error");
            let own = task_asset_path(messages).unwrap();
            Ok(ReasonerStep::ToolCalls(vec![tool_call(
                "call_own",
                "voice_processor",
                json!({"voice_data_file_path": own}),
            )]))
        })
        .then_final("done");

    let h = harness(FakeInference::new().with_transcript("three leeks"), reasoner).await;
    *h_assets.lock().unwrap() = Some(h.assets.clone());

    let other_asset = h
        .assets
        .materialize(&wav_base64(), pantry_ai::assets::AssetKind::Audio)
        .unwrap();
    *other_path.lock().unwrap() = Some(other_asset.path().to_path_buf());

    let outcome = h
        .orchestrator
        .run(envelope(Modality::Audio, &wav_base64()))
        .await
        .unwrap();

    let results: Vec<bool> = outcome.tool_calls.iter().map(|c| c.success).collect();
    assert_eq!(results, vec![false, true]);
    assert_eq!(h.inference.calls().len(), 1);

    // The other request's file survives until its owner releases it
    assert!(other_asset.path().exists());
    assert_eq!(h.temp_files().len(), 1);
    other_asset.release();
    assert!(h.temp_files().is_empty());
    assert_eq!(h.assets.outstanding(), 0);
}
