//! Annotate Module Tests
//!
//! ## Test Scopes
//! - **Annotator**: Default fallbacks and the attribute listing formats.
//! - **Decorator**: Region parsing and scaling onto a drawn thumbnail.
//! - **Thumbnail**: Each step of the source fallback chain, including re-fetch.

#[cfg(test)]
mod tests {
    use crate::annotate::annotator::{Annotator, AttributeAnnotator};
    use crate::annotate::decorator::{Decoration, Decorator, RegionDecorator};
    use crate::annotate::thumbnail::*;
    use crate::session::scripted::{Script, ScriptedFactory};
    use crate::session::types::SearchResult;

    struct Fixed;

    impl Annotator for Fixed {
        fn annotate(&self, result: &SearchResult) -> Option<String> {
            Some(format!("{}\nsecond line", result.object_id()))
        }
    }

    // ============================================================
    // TEST 1: Annotator
    // ============================================================

    #[test]
    fn test_default_forms_fall_back_to_annotate() {
        // ARRANGE
        let result = SearchResult::new("obj-7", Vec::new());

        // ACT
        let annotations = Fixed.annotations(&result);

        // ASSERT: Tooltip reuses the full text, one-line keeps the first line
        assert_eq!(annotations.full.as_deref(), Some("obj-7\nsecond line"));
        assert_eq!(annotations.tooltip, annotations.full);
        assert_eq!(annotations.one_line.as_deref(), Some("obj-7"));
    }

    #[test]
    fn test_attribute_annotator_formats() {
        // ARRANGE
        let annotator =
            AttributeAnnotator::new(vec!["_cols.int".to_string(), "label".to_string()]);
        let result = SearchResult::new("obj-1", Vec::new())
            .with_int_attribute("_cols.int", 640)
            .with_attribute("label", b"cat".to_vec());

        // ACT
        let annotations = annotator.annotations(&result);

        // ASSERT
        assert_eq!(
            annotations.full.as_deref(),
            Some("<html>_cols.int = 640<br>label = cat</html>")
        );
        assert_eq!(
            annotations.non_html.as_deref(),
            Some("_cols.int = 640\nlabel = cat")
        );
        assert_eq!(
            annotations.one_line.as_deref(),
            Some("_cols.int = 640, label = cat")
        );
    }

    #[test]
    fn test_attribute_annotator_without_matches() {
        // ARRANGE
        let annotator = AttributeAnnotator::new(vec!["score".to_string()]);
        let result = SearchResult::new("obj-1", Vec::new());

        // ACT
        let annotations = annotator.annotations(&result);

        // ASSERT: Verbose always names the object
        assert!(annotations.full.is_none());
        assert!(annotations.one_line.is_none());
        assert_eq!(annotations.verbose.as_deref(), Some("obj-1\n"));
    }

    #[test]
    fn test_binary_attribute_shows_length() {
        // ARRANGE
        let annotator = AttributeAnnotator::new(vec!["blob".to_string()]);
        let result = SearchResult::new("obj-1", Vec::new()).with_attribute("blob", vec![0xff, 0xfe]);

        // ACT
        let text = annotator.annotate_non_html(&result);

        // ASSERT
        assert_eq!(text.as_deref(), Some("blob = <2 bytes>"));
    }

    // ============================================================
    // TEST 2: Decorator
    // ============================================================

    #[test]
    fn test_region_decorator_parses_groups() {
        // ARRANGE
        let decorator = RegionDecorator::new("regions");
        let result = SearchResult::new("obj-1", Vec::new())
            .with_attribute("regions", b"10,20,30,40,face; 1.5, 2, 3, 4".to_vec());

        // ACT
        let decorations = decorator.decorate(&result);

        // ASSERT
        assert_eq!(
            decorations,
            vec![
                Decoration::Region {
                    x: 10.0,
                    y: 20.0,
                    width: 30.0,
                    height: 40.0,
                    label: Some("face".to_string()),
                },
                Decoration::Region {
                    x: 1.5,
                    y: 2.0,
                    width: 3.0,
                    height: 4.0,
                    label: None,
                },
            ]
        );
    }

    #[test]
    fn test_region_decorator_skips_malformed_groups() {
        // ARRANGE
        let decorator = RegionDecorator::new("regions");
        let malformed = SearchResult::new("obj-1", Vec::new())
            .with_attribute("regions", b"1,2,3;x,1,1,1;0,0,-5,5;0,0,2,2;".to_vec());
        let missing = SearchResult::new("obj-2", Vec::new());

        // ACT
        let kept = decorator.decorate(&malformed);
        let none = decorator.decorate(&missing);

        // ASSERT: Only the last, well-formed group survives
        assert_eq!(kept.len(), 1);
        assert!(none.is_empty());
    }

    #[test]
    fn test_decorations_scale_to_drawn_thumbnail() {
        // ARRANGE: Server thumbnail of a 1000px-wide object, decoded at 200px, drawn at 100px
        let source = ThumbnailSource::Thumbnail {
            bytes: b"jpeg".to_vec(),
            full_width: Some(1000),
        };
        let region = Decoration::Region {
            x: 100.0,
            y: 200.0,
            width: 50.0,
            height: 10.0,
            label: None,
        };

        // ACT
        let scale = source.decoration_scale(200, 100);
        let drawn = region.scaled(scale);

        // ASSERT
        assert_eq!(scale, 0.1);
        assert_eq!(
            drawn,
            Decoration::Region {
                x: 10.0,
                y: 20.0,
                width: 5.0,
                height: 1.0,
                label: None,
            }
        );
        // Without a known object width the decoded image is the reference
        assert_eq!(
            ThumbnailSource::ObjectData(Vec::new()).decoration_scale(400, 100),
            0.25
        );
        assert_eq!(
            ThumbnailSource::ObjectData(Vec::new()).decoration_scale(0, 100),
            1.0
        );
    }

    // ============================================================
    // TEST 3: Thumbnail source
    // ============================================================

    #[test]
    fn test_thumbnail_attribute_preferred() {
        // ARRANGE
        let result = SearchResult::new("a", b"full".to_vec())
            .with_attribute(THUMBNAIL_ATTR, b"jpeg".to_vec())
            .with_int_attribute(COLS_ATTR, 1024);

        // ACT
        let source = ThumbnailSource::resolve(&result, None);

        // ASSERT
        assert_eq!(
            source,
            Some(ThumbnailSource::Thumbnail {
                bytes: b"jpeg".to_vec(),
                full_width: Some(1024),
            })
        );
    }

    #[test]
    fn test_object_data_used_without_thumbnail() {
        // ARRANGE
        let result = SearchResult::new("a", b"full".to_vec());

        // ACT
        let source = ThumbnailSource::resolve(&result, None);

        // ASSERT
        assert_eq!(source, Some(ThumbnailSource::ObjectData(b"full".to_vec())));
    }

    #[test]
    fn test_empty_data_refetched_from_factory() {
        // ARRANGE: Object delivered without data
        let mut script = Script::numbered(1);
        script.objects[0].lazy = true;
        let factory = ScriptedFactory::new(script);
        let result = SearchResult::new("obj-1", Vec::new());

        // ACT
        let source = ThumbnailSource::resolve(&result, Some(&factory));

        // ASSERT
        assert_eq!(
            source,
            Some(ThumbnailSource::ObjectData(b"object 1".to_vec()))
        );
    }

    #[test]
    fn test_raw_rgb_fallback() {
        // ARRANGE
        let pixels = vec![
            0x10, 0x20, 0x30, 0, //
            0x40, 0x50, 0x60, 0,
        ];
        let result = SearchResult::new("a", Vec::new())
            .with_attribute(RGB_IMAGE_ATTR, pixels)
            .with_int_attribute(COLS_ATTR, 2)
            .with_int_attribute(ROWS_ATTR, 1);

        // ACT
        let source = ThumbnailSource::resolve(&result, None).unwrap();

        // ASSERT
        assert_eq!(source.rgb_at(0, 0), Some(0x102030));
        assert_eq!(source.rgb_at(1, 0), Some(0x405060));
        assert_eq!(source.rgb_at(2, 0), None);
        assert_eq!(source.decoration_scale(2, 1), 0.5);
    }

    #[test]
    fn test_truncated_raw_rgb_rejected() {
        // ARRANGE: 7 bytes for a 2x1 image needing 8
        let result = SearchResult::new("a", Vec::new())
            .with_attribute(RGB_IMAGE_ATTR, vec![0; 7])
            .with_int_attribute(COLS_ATTR, 2)
            .with_int_attribute(ROWS_ATTR, 1);

        // ACT
        let source = ThumbnailSource::resolve(&result, None);

        // ASSERT
        assert_eq!(source, None);
    }

    #[test]
    fn test_nothing_available_is_none() {
        // ARRANGE
        let factory = ScriptedFactory::new(Script::default());
        let result = SearchResult::new("ghost", Vec::new());

        // ACT
        let source = ThumbnailSource::resolve(&result, Some(&factory));

        // ASSERT
        assert_eq!(source, None);
    }
}
