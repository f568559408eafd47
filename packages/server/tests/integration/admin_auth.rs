use serde_json::json;

use crate::common::{TestApp, routes};

mod admin_login {
    use super::*;

    #[tokio::test]
    async fn admin_can_log_in_and_check_the_session() {
        let app = TestApp::spawn().await;
        app.create_admin(&app.client, "root", "Sup3r_secret").await;

        let session = app.get(&app.client, routes::ADMIN_SESSION).await;
        assert_eq!(session.status, 200);
        assert_eq!(session.body["authenticated"], true);
        assert_eq!(session.body["admin"]["username"], "root");
    }

    #[tokio::test]
    async fn admin_credentials_fail_uniformly() {
        let app = TestApp::spawn().await;
        app.create_admin(&app.client, "root", "Sup3r_secret").await;

        let browser = TestApp::new_browser();
        let wrong_password = app
            .post(
                &browser,
                routes::ADMIN_LOGIN,
                &json!({"username": "root", "password": "Wrong_pass1"}),
            )
            .await;
        let unknown_user = app
            .post(
                &browser,
                routes::ADMIN_LOGIN,
                &json!({"username": "ghost", "password": "Wrong_pass1"}),
            )
            .await;

        assert_eq!(wrong_password.status, 401);
        assert_eq!(unknown_user.status, 401);
        assert_eq!(wrong_password.body["message"], unknown_user.body["message"]);
    }

    #[tokio::test]
    async fn anonymous_session_check_reports_unauthenticated() {
        let app = TestApp::spawn().await;

        let session = app.get(&app.client, routes::ADMIN_SESSION).await;
        assert_eq!(session.status, 200);
        assert_eq!(session.body["authenticated"], false);
    }

    #[tokio::test]
    async fn admin_endpoints_reject_players_and_anonymous_callers() {
        let app = TestApp::spawn().await;
        app.register_player(&app.client, "alice").await;

        // A logged-in player is not an admin.
        let res = app.get(&app.client, routes::ADMIN_STATS).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "ADMIN_AUTH_REQUIRED");

        let anonymous = TestApp::new_browser();
        let res = app.get(&anonymous, routes::ADMIN_STATS).await;
        assert_eq!(res.status, 401);
    }
}

mod role_exclusion {
    use super::*;

    #[tokio::test]
    async fn player_login_clears_the_admin_identity() {
        let app = TestApp::spawn().await;
        app.create_admin(&app.client, "root", "Sup3r_secret").await;
        app.register_player(&app.client, "alice").await;

        // The same browser is now a player, and only a player.
        let me = app.get(&app.client, routes::ME).await;
        assert_eq!(me.status, 200);

        let session = app.get(&app.client, routes::ADMIN_SESSION).await;
        assert_eq!(session.body["authenticated"], false);
    }

    #[tokio::test]
    async fn admin_login_clears_the_player_identity() {
        let app = TestApp::spawn().await;
        app.register_player(&app.client, "alice").await;
        app.create_admin(&app.client, "root", "Sup3r_secret").await;

        let session = app.get(&app.client, routes::ADMIN_SESSION).await;
        assert_eq!(session.body["authenticated"], true);

        let me = app.get(&app.client, routes::ME).await;
        assert_eq!(me.status, 401);
    }

    #[tokio::test]
    async fn admin_login_regenerates_the_session_id() {
        let app = TestApp::spawn().await;
        let registered = app.register_player(&app.client, "alice").await;
        let player_session = registered.session_id();

        let password_hash = server::utils::hash::hash_password("Sup3r_secret").unwrap();
        use sea_orm::{ActiveModelTrait, Set};
        server::entity::admin_user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set("root".to_string()),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&app.db)
        .await
        .unwrap();

        let login = app
            .post(
                &app.client,
                routes::ADMIN_LOGIN,
                &json!({"username": "root", "password": "Sup3r_secret"}),
            )
            .await;
        assert_eq!(login.status, 200);
        assert_ne!(player_session, login.session_id());
    }
}

mod logout_isolation {
    use super::*;

    #[tokio::test]
    async fn admin_logout_leaves_other_browsers_untouched() {
        let app = TestApp::spawn().await;
        app.create_admin(&app.client, "root", "Sup3r_secret").await;

        let player_browser = TestApp::new_browser();
        app.register_player(&player_browser, "alice").await;

        let res = app.post_empty(&app.client, routes::ADMIN_LOGOUT).await;
        assert_eq!(res.status, 200);

        // The admin browser lost its admin identity.
        let session = app.get(&app.client, routes::ADMIN_SESSION).await;
        assert_eq!(session.body["authenticated"], false);

        // The player browser is unaffected.
        let me = app.get(&player_browser, routes::ME).await;
        assert_eq!(me.status, 200);
    }

    #[tokio::test]
    async fn universal_logout_destroys_the_whole_session() {
        let app = TestApp::spawn().await;
        app.register_player(&app.client, "alice").await;

        let res = app.post_empty(&app.client, routes::UNIVERSAL_LOGOUT).await;
        assert_eq!(res.status, 200);

        let me = app.get(&app.client, routes::ME).await;
        assert_eq!(me.status, 401);
        let session = app.get(&app.client, routes::ADMIN_SESSION).await;
        assert_eq!(session.body["authenticated"], false);
    }
}
