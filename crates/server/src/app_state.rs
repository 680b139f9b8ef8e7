use server_api::ApiContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) read_api_key: String,
    pub(crate) admin_jwt_secret: String,
}
