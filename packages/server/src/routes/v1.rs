use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/challenges", challenge_routes())
        .nest("/categories", category_routes())
        .nest("/difficulties", difficulty_routes())
        .nest("/announcements", announcement_routes())
        .nest("/install", install_routes())
        .nest("/system", system_routes())
        .merge(public_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::login))
        .routes(routes!(handlers::admin::logout))
        .routes(routes!(handlers::admin::session_status))
        .routes(routes!(handlers::admin::list_challenges))
        .routes(routes!(handlers::admin::get_challenge))
        .routes(routes!(handlers::admin::stats))
        .routes(routes!(handlers::admin::list_settings))
        .routes(routes!(handlers::admin::set_setting_value))
}

fn challenge_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::challenge::list_challenges,
            handlers::challenge::create_challenge
        ))
        .routes(routes!(
            handlers::challenge::get_challenge,
            handlers::challenge::update_challenge,
            handlers::challenge::delete_challenge
        ))
        .routes(routes!(handlers::challenge::submit_flag))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::category::list_categories,
            handlers::category::create_category
        ))
        .routes(routes!(
            handlers::category::get_category,
            handlers::category::update_category,
            handlers::category::delete_category
        ))
}

fn difficulty_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::difficulty::list_difficulties,
            handlers::difficulty::create_difficulty
        ))
        .routes(routes!(
            handlers::difficulty::get_difficulty,
            handlers::difficulty::update_difficulty,
            handlers::difficulty::delete_difficulty
        ))
}

fn announcement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::announcement::list_announcements,
            handlers::announcement::create_announcement
        ))
        .routes(routes!(handlers::announcement::list_active_announcements))
        .routes(routes!(
            handlers::announcement::update_announcement,
            handlers::announcement::delete_announcement
        ))
}

fn install_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::install::check))
        .routes(routes!(handlers::install::system_check))
        .routes(routes!(handlers::install::setup))
        .routes(routes!(handlers::install::health))
        .routes(routes!(handlers::install::seed_demo))
        .routes(routes!(handlers::install::reset_demo))
}

fn system_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::system::info))
        .routes(routes!(handlers::system::export_json))
        .routes(routes!(handlers::system::export_sql))
        .routes(routes!(handlers::system::import_check))
        .routes(routes!(handlers::system::import_json))
        .routes(routes!(handlers::system::import_sql))
}

fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::public::site_info))
        .routes(routes!(handlers::public::universal_logout))
        .routes(routes!(handlers::public::solved_challenges))
        .routes(routes!(handlers::public::leaderboard))
}
