use rocket::Route;

pub mod auth;
pub mod backoffice;
mod common;
pub mod pages;
pub mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(pages::routes());
    routes.extend(auth::routes());
    routes.extend(voting::routes());
    routes.extend(backoffice::routes());
    routes
}
