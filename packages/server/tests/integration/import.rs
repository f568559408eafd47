use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn snapshot(data: Value) -> Value {
    json!({
        "version": "1.0.0",
        "export_date": "2024-06-01T00:00:00Z",
        "data": data,
    })
}

fn category_record(id: &str, name: &str, slug: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": slug,
        "description": null,
        "color": null,
        "icon": null,
        "sort_order": 0,
    })
}

/// Build an import request body with a single resolution entry.
fn import_request(data: &Value, resolution_key: &str, resolution: Value) -> Value {
    let mut resolutions = serde_json::Map::new();
    resolutions.insert(resolution_key.to_string(), resolution);
    json!({"data": data, "resolutions": resolutions})
}

mod export {
    use super::*;

    #[tokio::test]
    async fn json_export_carries_the_versioned_envelope() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        app.create_category(&admin, "Web", "web").await;

        let res = app.post_empty(&admin, routes::EXPORT_JSON).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["version"], "1.0.0");
        assert!(res.body["export_date"].is_string());
        assert_eq!(res.body["data"]["categories"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["data"]["categories"][0]["slug"], "web");
    }

    #[tokio::test]
    async fn exports_are_admin_only() {
        let app = TestApp::spawn().await;
        let res = app.post_empty(&app.client, routes::EXPORT_JSON).await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn system_info_reports_table_counts() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        app.create_category(&admin, "Web", "web").await;

        let res = app.get(&admin, routes::SYSTEM_INFO).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["database"]["categories"], 1);
        assert_eq!(res.body["database"]["challenges"], 0);
    }
}

mod diff {
    use super::*;

    #[tokio::test]
    async fn absent_records_are_new_and_present_records_conflict() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        let live_id = app.create_category(&admin, "Web", "web").await;

        let payload = json!({"data": snapshot(json!({
            "categories": [
                category_record(&live_id, "Pwn", "pwn"),
                category_record("brand-new", "Crypto", "crypto"),
            ],
        }))});

        let res = app.post(&admin, routes::IMPORT_CHECK, &payload).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_conflicts"], 1);
        assert_eq!(res.body["conflicts"][0]["type"], "category");
        assert_eq!(res.body["conflicts"][0]["key"], live_id.as_str());
        assert_eq!(res.body["conflicts"][0]["existing"]["name"], "Web");
        assert_eq!(res.body["conflicts"][0]["incoming"]["name"], "Pwn");
        assert_eq!(res.body["new_items"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["new_items"][0]["data"]["id"], "brand-new");
    }

    #[tokio::test]
    async fn malformed_records_collect_errors_without_aborting() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let payload = json!({"data": snapshot(json!({
            "categories": [
                json!({"name": "No id"}),
                category_record("ok", "Fine", "fine"),
            ],
        }))});

        let res = app.post(&admin, routes::IMPORT_CHECK, &payload).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["new_items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_backup_versions_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let payload = json!({"data": {
            "version": "2.0.0",
            "export_date": "2024-06-01T00:00:00Z",
            "data": {},
        }});

        let res = app.post(&admin, routes::IMPORT_CHECK, &payload).await;
        assert_eq!(res.status, 400);
    }
}

mod apply {
    use super::*;

    #[tokio::test]
    async fn new_items_apply_in_dependency_order() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        let difficulty_id = app.create_difficulty(&admin, "Easy", "easy").await;

        // The challenge references a category that only exists in the same
        // snapshot; category insertion must come first.
        let payload = json!({"data": snapshot(json!({
            "categories": [category_record("c1", "Web", "web")],
            "challenges": [{
                "id": "ch1",
                "title": "X",
                "description": "d",
                "category_id": "c1",
                "difficulty_id": difficulty_id,
                "points": 100,
                "flag": "flag{x}",
            }],
        }))});

        let res = app.post(&admin, routes::IMPORT_JSON, &payload).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["imported"], 2);
        assert_eq!(res.body["skipped"], 0);

        let category = app.get(&app.client, &routes::category("c1")).await;
        assert_eq!(category.status, 200);
        let challenge = app.get(&app.client, &routes::challenge("ch1")).await;
        assert_eq!(challenge.status, 200);
        assert_eq!(challenge.body["category_id"], "c1");
    }

    #[tokio::test]
    async fn apply_refuses_unresolved_conflicts() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        let live_id = app.create_category(&admin, "Web", "web").await;

        let payload = json!({"data": snapshot(json!({
            "categories": [category_record(&live_id, "Pwn", "web")],
        }))});

        let res = app.post(&admin, routes::IMPORT_JSON, &payload).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("0/1"));

        // Nothing changed.
        let category = app.get(&app.client, &routes::category(&live_id)).await;
        assert_eq!(category.body["name"], "Web");
    }

    #[tokio::test]
    async fn skip_update_and_edited_resolutions_behave_distinctly() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        let live_id = app.create_category(&admin, "web", "web").await;

        let data = snapshot(json!({
            "categories": [category_record(&live_id, "pwn", "web")],
        }));
        let key = format!("category-{live_id}");

        // skip: live record untouched
        let res = app
            .post(
                &admin,
                routes::IMPORT_JSON,
                &import_request(&data, &key, json!("skip")),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["skipped"], 1);
        let category = app.get(&app.client, &routes::category(&live_id)).await;
        assert_eq!(category.body["name"], "web");

        // update: incoming record verbatim
        let res = app
            .post(
                &admin,
                routes::IMPORT_JSON,
                &import_request(&data, &key, json!("update")),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["imported"], 1);
        let category = app.get(&app.client, &routes::category(&live_id)).await;
        assert_eq!(category.body["name"], "pwn");

        // edited: administrator-modified variant wins
        let edited = json!({"edited": {
            "id": live_id,
            "name": "crypto",
            "slug": "web",
            "description": null,
            "color": null,
            "icon": null,
            "sort_order": 0,
        }});
        let res = app
            .post(
                &admin,
                routes::IMPORT_JSON,
                &import_request(&data, &key, edited),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let category = app.get(&app.client, &routes::category(&live_id)).await;
        assert_eq!(category.body["name"], "crypto");
    }

    #[tokio::test]
    async fn settings_merge_on_their_natural_key() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        app.put(
            &admin,
            &routes::admin_setting("site_name"),
            &json!({"value": "Old name"}),
        )
        .await;

        let data = snapshot(json!({
            "settings": [{
                "key": "site_name",
                "value": "New name",
                "updated_at": "2024-06-01T00:00:00Z",
            }],
        }));

        let check = app
            .post(&admin, routes::IMPORT_CHECK, &json!({"data": &data}))
            .await;
        assert_eq!(check.body["total_conflicts"], 1);
        assert_eq!(check.body["conflicts"][0]["type"], "setting");
        assert_eq!(check.body["conflicts"][0]["key"], "site_name");

        let res = app
            .post(
                &admin,
                routes::IMPORT_JSON,
                &import_request(&data, "setting-site_name", json!("update")),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let site = app.get(&app.client, routes::SITE_INFO).await;
        assert_eq!(site.body["site_name"], "New name");
    }

    #[tokio::test]
    async fn edited_resolutions_cannot_forge_password_hashes() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;
        app.register_player(&app.client, "alice").await;

        // Export the live player record, then import it back with an edit
        // that tries to swap the stored hash.
        let export = app.post_empty(&admin, routes::EXPORT_JSON).await;
        let player = export.body["data"]["players"][0].clone();
        let player_id = player["id"].as_str().unwrap().to_string();

        let mut edited = player.clone();
        edited["score"] = json!(5000);
        edited["password_hash"] = json!("$argon2id$forged");

        let data = snapshot(json!({"players": [player]}));
        let key = format!("player-{player_id}");
        let res = app
            .post(
                &admin,
                routes::IMPORT_JSON,
                &import_request(&data, &key, json!({"edited": edited})),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        // The edit to the score stuck, but the hash edit was discarded:
        // the original password still works.
        let browser = TestApp::new_browser();
        let login = app
            .post(
                &browser,
                routes::LOGIN,
                &json!({"username": "alice", "password": "s3cure_Pass"}),
            )
            .await;
        assert_eq!(login.status, 200, "{}", login.text);
        assert_eq!(login.body["user"]["score"], 5000);
    }

    #[tokio::test]
    async fn one_bad_record_rolls_back_the_entire_import() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        // Nine valid records and one that cannot decode (missing points).
        let mut categories = Vec::new();
        for index in 0..9 {
            categories.push(category_record(
                &format!("c{index}"),
                &format!("Category {index}"),
                &format!("slug-{index}"),
            ));
        }
        let payload = json!({"data": snapshot(json!({
            "categories": categories,
            "challenges": [{
                "id": "broken",
                "title": "No points",
                "description": "d",
                "category_id": "c0",
                "difficulty_id": "d0",
                "flag": "flag{x}",
            }],
        }))});

        let res = app.post(&admin, routes::IMPORT_JSON, &payload).await;
        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.body["code"], "IMPORT_FAILED");
        assert!(res.body["message"].as_str().unwrap().contains("rolled back"));

        // Full rollback: none of the nine valid categories landed.
        let categories = app.get(&app.client, routes::CATEGORIES).await;
        assert!(categories.body.as_array().unwrap().is_empty());
    }
}

mod sql_roundtrip {
    use super::*;

    #[tokio::test]
    async fn sql_export_reimports_cleanly() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let category_id = app.create_category(&admin, "It's web", "web").await;
        let difficulty_id = app.create_difficulty(&admin, "Easy", "easy").await;
        app.create_challenge(&admin, "C1", &category_id, &difficulty_id, 100, "flag{x}")
            .await;

        let export = app.post_empty(&admin, routes::EXPORT_SQL).await;
        assert_eq!(export.status, 200);
        assert!(export.text.contains("session_replication_role"));
        // The quote in the category name survives escaping.
        assert!(export.text.contains("It''s web"));

        let res = app
            .post(&admin, routes::IMPORT_SQL, &json!({"sql": export.text}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["executed"].as_u64().unwrap() > 0);

        // Same data before and after.
        let categories = app.get(&app.client, routes::CATEGORIES).await;
        assert_eq!(categories.body.as_array().unwrap().len(), 1);
        assert_eq!(categories.body[0]["name"], "It's web");
        let challenges = app.get(&app.client, routes::CHALLENGES).await;
        assert_eq!(challenges.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_sql_statements_roll_back_everything() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let sql = "INSERT INTO \"settings\" (\"key\", \"value\", \"updated_at\") \
                   VALUES ('probe', 'v', '2024-06-01T00:00:00Z');\n\
                   INSERT INTO \"no_such_table\" (\"x\") VALUES ('y');";

        let res = app
            .post(&admin, routes::IMPORT_SQL, &json!({"sql": sql}))
            .await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "IMPORT_FAILED");

        // The first statement was rolled back with the second.
        let settings = app.get(&admin, routes::ADMIN_SETTINGS).await;
        assert!(
            settings
                .body
                .as_array()
                .unwrap()
                .iter()
                .all(|s| s["key"] != "probe")
        );
    }
}
