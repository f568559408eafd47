use serde_json::json;

use crate::common::{TestApp, routes};

/// Set up an admin client plus one challenge; returns (admin, challenge id).
async fn app_with_challenge(points: i32, flag: &str) -> (TestApp, reqwest::Client, String) {
    let app = TestApp::spawn().await;
    let admin = TestApp::new_browser();
    app.create_admin(&admin, "root", "Sup3r_secret").await;

    let category_id = app.create_category(&admin, "Web", "web").await;
    let difficulty_id = app.create_difficulty(&admin, "Easy", "easy").await;
    let challenge_id = app
        .create_challenge(&admin, "Login Bypass", &category_id, &difficulty_id, points, flag)
        .await;

    (app, admin, challenge_id)
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn public_listings_never_contain_flags() {
        let (app, admin, challenge_id) = app_with_challenge(100, "flag{secret}").await;

        let public = app.get(&app.client, routes::CHALLENGES).await;
        assert_eq!(public.status, 200);
        let listed = public.body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].get("flag").is_none(), "flag leaked: {}", public.text);

        let detail = app
            .get(&app.client, &routes::challenge(&challenge_id))
            .await;
        assert_eq!(detail.status, 200);
        assert!(detail.body.get("flag").is_none());

        // Admins see the flag.
        let admin_view = app.get(&admin, routes::ADMIN_CHALLENGES).await;
        assert_eq!(admin_view.status, 200);
        assert_eq!(admin_view.body[0]["flag"], "flag{secret}");
    }

    #[tokio::test]
    async fn unknown_challenge_is_a_404() {
        let app = TestApp::spawn().await;
        let res = app.get(&app.client, &routes::challenge("missing")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod flag_submission {
    use super::*;

    #[tokio::test]
    async fn correct_flag_scores_once_and_only_once() {
        let (app, _admin, challenge_id) = app_with_challenge(100, "flag{right}").await;
        app.register_player(&app.client, "alice").await;

        let first = app
            .post(
                &app.client,
                &routes::challenge_submit(&challenge_id),
                &json!({"flag": "flag{right}"}),
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["correct"], true);
        assert_eq!(first.body["already_solved"], false);

        let me = app.get(&app.client, routes::ME).await;
        assert_eq!(me.body["score"], 100);

        // Second correct submission: already solved, score unchanged.
        let second = app
            .post(
                &app.client,
                &routes::challenge_submit(&challenge_id),
                &json!({"flag": "flag{right}"}),
            )
            .await;
        assert_eq!(second.body["correct"], true);
        assert_eq!(second.body["already_solved"], true);

        let me = app.get(&app.client, routes::ME).await;
        assert_eq!(me.body["score"], 100);
    }

    #[tokio::test]
    async fn wrong_flag_records_a_submission_without_scoring() {
        let (app, admin, challenge_id) = app_with_challenge(100, "flag{right}").await;
        app.register_player(&app.client, "alice").await;

        let res = app
            .post(
                &app.client,
                &routes::challenge_submit(&challenge_id),
                &json!({"flag": "flag{wrong}"}),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["correct"], false);
        assert_eq!(res.body["already_solved"], false);

        let me = app.get(&app.client, routes::ME).await;
        assert_eq!(me.body["score"], 0);

        // Exactly one submission was recorded.
        let stats = app.get(&admin, routes::ADMIN_STATS).await;
        assert_eq!(stats.body["total_submissions"], 1);
        assert_eq!(stats.body["successful_solves"], 0);
    }

    #[tokio::test]
    async fn flags_are_compared_trimmed() {
        let (app, _admin, challenge_id) = app_with_challenge(50, "flag{padded}").await;
        app.register_player(&app.client, "alice").await;

        let res = app
            .post(
                &app.client,
                &routes::challenge_submit(&challenge_id),
                &json!({"flag": "  flag{padded}  "}),
            )
            .await;
        assert_eq!(res.body["correct"], true);
    }

    #[tokio::test]
    async fn submission_requires_a_player_session() {
        let (app, _admin, challenge_id) = app_with_challenge(100, "flag{right}").await;

        let res = app
            .post(
                &app.client,
                &routes::challenge_submit(&challenge_id),
                &json!({"flag": "flag{right}"}),
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "LOGIN_REQUIRED");
    }

    #[tokio::test]
    async fn solved_list_and_leaderboard_reflect_scoring() {
        let (app, _admin, challenge_id) = app_with_challenge(100, "flag{right}").await;
        app.register_player(&app.client, "alice").await;

        let bob = TestApp::new_browser();
        app.register_player(&bob, "bob").await;

        app.post(
            &app.client,
            &routes::challenge_submit(&challenge_id),
            &json!({"flag": "flag{right}"}),
        )
        .await;

        let solved = app.get(&app.client, routes::SOLVED).await;
        assert_eq!(solved.body.as_array().unwrap().len(), 1);
        assert_eq!(solved.body[0], challenge_id.as_str());

        let board = app.get(&app.client, routes::LEADERBOARD).await;
        let entries = board.body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["username"], "alice");
        assert_eq!(entries[0]["score"], 100);
        assert_eq!(entries[0]["solved_count"], 1);
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[1]["username"], "bob");
        assert_eq!(entries[1]["rank"], 2);
    }
}

mod challenge_crud {
    use super::*;

    #[tokio::test]
    async fn challenge_creation_requires_existing_references() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let res = app
            .post(
                &admin,
                routes::CHALLENGES,
                &json!({
                    "title": "Orphan",
                    "description": "No home",
                    "category_id": "missing",
                    "difficulty_id": "missing",
                    "points": 100,
                    "flag": "flag{x}",
                }),
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn challenge_writes_require_admin() {
        let app = TestApp::spawn().await;
        app.register_player(&app.client, "alice").await;

        let res = app
            .post(
                &app.client,
                routes::CHALLENGES,
                &json!({
                    "title": "Nope",
                    "description": "x",
                    "category_id": "c",
                    "difficulty_id": "d",
                    "points": 1,
                    "flag": "flag{x}",
                }),
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "ADMIN_AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn update_and_delete_roundtrip() {
        let (app, admin, challenge_id) = app_with_challenge(100, "flag{v1}").await;

        let detail = app.get(&admin, &routes::challenge(&challenge_id)).await;
        let res = app
            .put(
                &admin,
                &routes::challenge(&challenge_id),
                &json!({
                    "title": "Login Bypass v2",
                    "description": "Updated",
                    "category_id": detail.body["category_id"],
                    "difficulty_id": detail.body["difficulty_id"],
                    "points": 150,
                    "flag": "flag{v2}",
                }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["points"], 150);
        assert_eq!(res.body["flag"], "flag{v2}");

        let res = app.delete(&admin, &routes::challenge(&challenge_id)).await;
        assert_eq!(res.status, 200);

        let res = app.get(&app.client, &routes::challenge(&challenge_id)).await;
        assert_eq!(res.status, 404);
    }
}
