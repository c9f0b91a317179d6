//! Session Module Tests
//!
//! ## Test Scopes
//! - **Result attributes**: Integer/string decoding and missing-attribute handling.
//! - **Searchlet validation**: Dependency checks before a search starts.
//! - **SessionHandle**: Close-once semantics.
//! - **Scripted backend**: Stream replay, failure injection, blocking until close.

#[cfg(test)]
mod tests {
    use crate::session::scripted::{Script, ScriptValue, ScriptedFactory, ScriptedSession};
    use crate::session::search::{SearchFactory, SearchSession, SessionHandle};
    use crate::session::types::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn rgb_searchlet() -> Searchlet {
        let mut searchlet = Searchlet::new();
        searchlet.add_filter(
            Filter::new(
                "rgb",
                FilterCode::default(),
                "f_eval_img2rgb",
                "f_init_img2rgb",
                "f_fini_img2rgb",
                1,
            )
            .with_merit(400),
        );
        searchlet.set_application_dependencies(vec!["rgb".to_string()]);
        searchlet
    }

    // ============================================================
    // TEST 1: Search result attributes
    // ============================================================

    #[test]
    fn test_int_attribute_is_little_endian() {
        // ARRANGE
        let result = SearchResult::new("a", Vec::new())
            .with_attribute("_cols.int", vec![0x80, 0x02, 0x00, 0x00]);

        // ACT & ASSERT
        assert_eq!(result.int_value("_cols.int"), Some(640));
    }

    #[test]
    fn test_short_int_attribute_is_none() {
        // ARRANGE
        let result = SearchResult::new("a", Vec::new()).with_attribute("_rows.int", vec![1, 2]);

        // ACT & ASSERT: Too short, and absent
        assert_eq!(result.int_value("_rows.int"), None);
        assert_eq!(result.int_value("missing"), None);
    }

    #[test]
    fn test_string_attribute_strips_trailing_nul() {
        // ARRANGE
        let result = SearchResult::new("a", Vec::new()).with_attribute("label", b"cat\0".to_vec());

        // ACT & ASSERT
        assert_eq!(result.string_value("label"), Some("cat"));
    }

    #[test]
    fn test_attribute_names_sorted() {
        // ARRANGE
        let result = SearchResult::new("a", Vec::new())
            .with_int_attribute("b", 1)
            .with_int_attribute("a", 2);

        // ACT
        let names = result.attribute_names();

        // ASSERT
        assert_eq!(names, vec!["a", "b"]);
    }

    // ============================================================
    // TEST 2: Searchlet validation
    // ============================================================

    #[test]
    fn test_valid_searchlet_passes() {
        // ARRANGE
        let searchlet = rgb_searchlet();

        // ACT
        let outcome = searchlet.validate();

        // ASSERT
        assert!(outcome.is_ok());
    }

    #[test]
    fn test_empty_searchlet_rejected() {
        // ACT
        let err = Searchlet::new().validate().unwrap_err();

        // ASSERT
        assert!(matches!(err, SessionError::InvalidSearchlet(_)));
    }

    #[test]
    fn test_unknown_application_dependency_rejected() {
        // ARRANGE
        let mut searchlet = rgb_searchlet();
        searchlet.set_application_dependencies(vec!["faces".to_string()]);

        // ACT
        let err = searchlet.validate().unwrap_err();

        // ASSERT
        assert!(err.to_string().contains("faces"));
    }

    #[test]
    fn test_unknown_filter_dependency_rejected() {
        // ARRANGE
        let mut searchlet = rgb_searchlet();
        searchlet.add_filter(
            Filter::new("hist", FilterCode::default(), "e", "i", "f", 10)
                .with_dependencies(vec!["edges".to_string()]),
        );

        // ACT
        let err = searchlet.validate().unwrap_err();

        // ASSERT
        assert!(err.to_string().contains("edges"));
    }

    // ============================================================
    // TEST 3: SessionHandle
    // ============================================================

    #[test]
    fn test_handle_closes_backend_once() {
        // ARRANGE
        let session = Arc::new(ScriptedSession::new(&Script::numbered(1)));
        let handle = SessionHandle::new(SessionId::new(), session.clone());

        // ACT
        let first = handle.close();
        let second = handle.close();

        // ASSERT: Only the first close reaches the backend
        assert!(first);
        assert!(!second);
        assert_eq!(session.close_calls(), 1);
    }

    #[test]
    fn test_handle_rejects_calls_after_close() {
        // ARRANGE
        let session = Arc::new(ScriptedSession::new(&Script::numbered(3)));
        let handle = SessionHandle::new(SessionId::new(), session.clone());

        // ACT
        handle.close();

        // ASSERT
        assert!(matches!(handle.next_result(), Err(SessionError::Closed)));
        assert!(matches!(handle.statistics(), Err(SessionError::Closed)));
        assert_eq!(session.delivered(), 0);
    }

    // ============================================================
    // TEST 4: Scripted backend
    // ============================================================

    #[test]
    fn test_scripted_session_replays_in_order() {
        // ARRANGE
        let session = ScriptedSession::new(&Script::numbered(3));

        // ACT
        let ids: Vec<String> = std::iter::from_fn(|| session.next_result().unwrap())
            .map(|r| r.object_id().0.clone())
            .collect();

        // ASSERT: Arrival order, then end of stream
        assert_eq!(ids, vec!["obj-1", "obj-2", "obj-3"]);
        assert!(session.next_result().unwrap().is_none());
    }

    #[test]
    fn test_scripted_session_injects_io_failure() {
        // ARRANGE
        let script = Script {
            fail_after: Some(1),
            ..Script::numbered(3)
        };
        let session = ScriptedSession::new(&script);

        // ACT & ASSERT
        assert!(session.next_result().unwrap().is_some());
        assert!(matches!(session.next_result(), Err(SessionError::Io(_))));
    }

    #[test]
    fn test_scripted_statistics_split_across_servers() {
        // ARRANGE: Five objects over two servers, three delivered
        let script = Script {
            servers: vec!["alpha".to_string(), "beta".to_string()],
            ..Script::numbered(5)
        };
        let session = ScriptedSession::new(&script);
        session.next_result().unwrap();
        session.next_result().unwrap();
        session.next_result().unwrap();

        // ACT
        let stats = session.statistics().unwrap();

        // ASSERT
        assert_eq!(stats["alpha"].total_objects, 3);
        assert_eq!(stats["beta"].total_objects, 2);
        assert_eq!(stats["alpha"].processed_objects, 2);
        assert_eq!(stats["beta"].processed_objects, 1);
    }

    #[test]
    fn test_hanging_session_unblocks_on_close() {
        // ARRANGE: A reader blocked past the end of the stream
        let script = Script {
            hang: true,
            ..Script::default()
        };
        let session = Arc::new(ScriptedSession::new(&script));

        let reader = {
            let session = session.clone();
            std::thread::spawn(move || session.next_result())
        };

        std::thread::sleep(Duration::from_millis(50));

        // ACT
        session.close();

        // ASSERT
        let outcome = reader.join().unwrap();
        assert!(matches!(outcome, Err(SessionError::Closed)));
    }

    #[test]
    fn test_merge_session_variables_unions_values() {
        // ARRANGE
        let script = Script {
            session_variables: HashMap::from([("mean".to_string(), 1.5)]),
            ..Script::default()
        };
        let session = ScriptedSession::new(&script);

        // ACT
        let merged = session
            .merge_session_variables(&HashMap::from([("stddev".to_string(), 0.5)]))
            .unwrap();

        // ASSERT
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["mean"], 1.5);
        assert_eq!(merged["stddev"], 0.5);
    }

    #[test]
    fn test_script_from_json() {
        // ARRANGE
        let json = r#"{
            "servers": ["alpha"],
            "objects": [
                { "id": "x", "data": "bytes", "attributes": { "_cols.int": 32, "label": "dog" } }
            ],
            "hang": true
        }"#;

        // ACT
        let script = Script::from_json(json).unwrap();

        // ASSERT
        assert!(script.hang);
        assert_eq!(script.objects.len(), 1);
        assert_eq!(script.objects[0].attributes["_cols.int"], ScriptValue::Int(32));
        assert_eq!(
            script.objects[0].attributes["label"],
            ScriptValue::Text("dog".to_string())
        );
    }

    #[test]
    fn test_factory_refetches_lazy_object() {
        // ARRANGE
        let mut script = Script::numbered(1);
        script.objects[0].lazy = true;
        let factory = ScriptedFactory::new(script);

        let session = factory
            .start(&Scope::new("all", ""), &rgb_searchlet())
            .unwrap();

        // ACT
        let delivered = session.next_result().unwrap().unwrap();
        let full = factory
            .generate_result(delivered.object_id(), &[])
            .unwrap();

        // ASSERT: Delivered without data, re-fetched with it
        assert!(delivered.data().is_empty());
        assert_eq!(full.data(), b"object 1");
        assert_eq!(factory.sessions_started(), 1);
    }

    #[test]
    fn test_factory_rejects_invalid_searchlet() {
        // ARRANGE
        let factory = ScriptedFactory::new(Script::default());

        // ACT
        let outcome = factory.start(&Scope::new("all", ""), &Searchlet::new());

        // ASSERT
        assert!(outcome.is_err());
        assert_eq!(factory.sessions_started(), 0);
    }
}
