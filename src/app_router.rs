use wasm_bindgen::JsValue;

use barentain_core::ids::{ResultToken, ValentineId};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Route {
    Origin,
    Create,
    Created { id: ValentineId },
    Answer { id: ValentineId },
    Result { token: ResultToken },
    MyValentines,
    NotFound,
}

pub(crate) fn parse_route(path: &str) -> Route {
    let trimmed = path.trim().trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };
    match path {
        "/" => return Route::Origin,
        "/create" => return Route::Create,
        "/my" => return Route::MyValentines,
        _ => {}
    }
    if let Some(rest) = path.strip_prefix("/v/") {
        return match ValentineId::parse(rest) {
            Ok(id) => Route::Answer { id },
            Err(_) => Route::NotFound,
        };
    }
    if let Some(rest) = path.strip_prefix("/r/") {
        return match ResultToken::parse(rest) {
            Ok(token) => Route::Result { token },
            Err(_) => Route::NotFound,
        };
    }
    if let Some(rest) = path.strip_prefix("/created/") {
        return match ValentineId::parse(rest) {
            Ok(id) => Route::Created { id },
            Err(_) => Route::NotFound,
        };
    }
    Route::NotFound
}

pub(crate) fn current_route() -> Route {
    let Some(window) = web_sys::window() else {
        return Route::NotFound;
    };
    let path = window
        .location()
        .pathname()
        .unwrap_or_else(|_| "/".to_string());
    parse_route(&path)
}

pub(crate) fn origin() -> String {
    web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .unwrap_or_default()
}

pub(crate) fn push_path(path: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    match window.history() {
        Ok(history) => {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
        Err(_) => {
            let _ = window.location().set_href(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;

    #[wasm_bindgen_test]
    fn static_paths_parse() {
        assert_eq!(parse_route("/"), Route::Origin);
        assert_eq!(parse_route(""), Route::Origin);
        assert_eq!(parse_route("/create"), Route::Create);
        assert_eq!(parse_route("/create/"), Route::Create);
        assert_eq!(parse_route("/my"), Route::MyValentines);
        assert_eq!(parse_route("/admin"), Route::NotFound);
    }

    #[wasm_bindgen_test]
    fn share_paths_parse_canonical_ids_only() {
        let id = ValentineId::random();
        let token = ResultToken::random();

        assert_eq!(parse_route(&format!("/v/{id}")), Route::Answer { id });
        assert_eq!(parse_route(&format!("/v/{id}/")), Route::Answer { id });
        assert_eq!(
            parse_route(&format!("/r/{token}")),
            Route::Result { token }
        );
        assert_eq!(
            parse_route(&format!("/created/{id}")),
            Route::Created { id }
        );

        assert_eq!(parse_route("/v/not-a-uuid"), Route::NotFound);
        assert_eq!(
            parse_route(&format!("/v/{}", id.to_string().to_uppercase())),
            Route::NotFound
        );
        assert_eq!(parse_route("/r/"), Route::NotFound);
    }
}
