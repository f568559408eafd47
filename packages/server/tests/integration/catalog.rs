use serde_json::json;

use crate::common::{TestApp, routes};

mod categories {
    use super::*;

    #[tokio::test]
    async fn slug_conflicts_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        app.create_category(&admin, "Web", "web").await;
        let res = app
            .post(
                &admin,
                routes::CATEGORIES,
                &json!({"name": "Web 2", "slug": "web"}),
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn referenced_category_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let category_id = app.create_category(&admin, "Web", "web").await;
        let difficulty_id = app.create_difficulty(&admin, "Easy", "easy").await;
        let challenge_id = app
            .create_challenge(&admin, "C1", &category_id, &difficulty_id, 100, "flag{x}")
            .await;

        let res = app.delete(&admin, &routes::category(&category_id)).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        // Remove the referencing challenge; now the delete goes through.
        let res = app.delete(&admin, &routes::challenge(&challenge_id)).await;
        assert_eq!(res.status, 200);
        let res = app.delete(&admin, &routes::category(&category_id)).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn category_listing_is_public_and_sorted() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        app.post(
            &admin,
            routes::CATEGORIES,
            &json!({"name": "Second", "slug": "second", "sort_order": 2}),
        )
        .await;
        app.post(
            &admin,
            routes::CATEGORIES,
            &json!({"name": "First", "slug": "first", "sort_order": 1}),
        )
        .await;

        let res = app.get(&app.client, routes::CATEGORIES).await;
        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }
}

mod difficulties {
    use super::*;

    #[tokio::test]
    async fn referenced_difficulty_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let category_id = app.create_category(&admin, "Web", "web").await;
        let difficulty_id = app.create_difficulty(&admin, "Easy", "easy").await;
        app.create_challenge(&admin, "C1", &category_id, &difficulty_id, 100, "flag{x}")
            .await;

        let res = app.delete(&admin, &routes::difficulty(&difficulty_id)).await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn difficulty_level_must_be_positive() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let res = app
            .post(
                &admin,
                routes::DIFFICULTIES,
                &json!({"name": "Impossible", "slug": "impossible", "level": 0}),
            )
            .await;
        assert_eq!(res.status, 400);
    }
}

mod announcements {
    use super::*;

    #[tokio::test]
    async fn active_filter_hides_inactive_announcements() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let visible = app
            .post(
                &admin,
                routes::ANNOUNCEMENTS,
                &json!({"title": "Visible", "message": "Hello", "type": "info", "is_active": 1}),
            )
            .await;
        assert_eq!(visible.status, 201, "{}", visible.text);
        assert_eq!(visible.body["created_by"], "root");

        let hidden = app
            .post(
                &admin,
                routes::ANNOUNCEMENTS,
                &json!({"title": "Hidden", "message": "Shh", "type": "warning", "is_active": 0}),
            )
            .await;
        assert_eq!(hidden.status, 201);

        let active = app
            .get(&app.client, "/api/v1/announcements/active")
            .await;
        assert_eq!(active.status, 200);
        let titles: Vec<&str> = active
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Visible"]);

        // The full listing is admin-only and contains both.
        let all = app.get(&admin, routes::ANNOUNCEMENTS).await;
        assert_eq!(all.body.as_array().unwrap().len(), 2);

        let public_all = app.get(&app.client, routes::ANNOUNCEMENTS).await;
        assert_eq!(public_all.status, 401);
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let res = app
            .post(
                &admin,
                routes::ANNOUNCEMENTS,
                &json!({"title": "Bad", "message": "x", "type": "fancy"}),
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn update_and_delete_roundtrip() {
        let app = TestApp::spawn().await;
        let admin = TestApp::new_browser();
        app.create_admin(&admin, "root", "Sup3r_secret").await;

        let created = app
            .post(
                &admin,
                routes::ANNOUNCEMENTS,
                &json!({"title": "V1", "message": "x", "type": "info"}),
            )
            .await;
        let id = created.id();

        let res = app
            .put(
                &admin,
                &routes::announcement(&id),
                &json!({"title": "V2", "message": "y", "type": "success", "is_active": 0}),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "V2");
        assert_eq!(res.body["is_active"], 0);

        let res = app.delete(&admin, &routes::announcement(&id)).await;
        assert_eq!(res.status, 200);
        let res = app.delete(&admin, &routes::announcement(&id)).await;
        assert_eq!(res.status, 404);
    }
}
