use crate::routes::{health, images};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "plate-server",
    description = "Menu-ready food photography via a generative image API",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(images::ImagesApi::openapi());
    root
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn docs_list_every_route() {
        let docs = get_docs();
        assert!(docs.paths.paths.contains_key("/health"));
        assert!(docs.paths.paths.contains_key("/images/transform"));
    }
}
