mod analytics;
mod app_router;
mod dodge_button;
mod error;
mod record_store;
mod result_tokens;
mod sender_identity;
mod storage;

use std::cell::Cell;
use std::rc::Rc;

use gloo::events::EventListener;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, InputEvent, MouseEvent, SubmitEvent};
use yew::prelude::*;

use barentain_core::{
    answer_url, create_valentine, fetch_result, fetch_valentine, submit_answer, Answer,
    RecordStore, ResultToken, Status, Valentine, ValentineId, Visitor,
};

use crate::analytics::{
    EVENT_ANSWERED_NO, EVENT_ANSWERED_YES, EVENT_ORIGIN_VIEW, EVENT_RECEIVER_OPENED,
    EVENT_RESULT_VIEWED, EVENT_VALENTINE_CREATED,
};
use crate::app_router::Route;
use crate::dodge_button::DodgeButton;
use crate::error::PageError;
use crate::sender_identity::ResultAccess;

#[derive(Properties, PartialEq)]
struct NavProps {
    navigate: Callback<String>,
}

#[derive(Properties, PartialEq)]
struct ValentineProps {
    navigate: Callback<String>,
    id: ValentineId,
}

#[derive(Properties, PartialEq)]
struct ResultProps {
    navigate: Callback<String>,
    token: ResultToken,
}

#[derive(Properties, PartialEq)]
struct ErrorCardProps {
    navigate: Callback<String>,
    error: PageError,
}

fn nav_button(navigate: &Callback<String>, path: &'static str) -> Callback<MouseEvent> {
    let navigate = navigate.clone();
    navigate.reform(move |_| path.to_string())
}

fn input_setter(state: UseStateHandle<String>) -> Callback<InputEvent> {
    Callback::from(move |event: InputEvent| {
        if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
            state.set(input.value());
        }
    })
}

#[function_component(ErrorCard)]
fn error_card(props: &ErrorCardProps) -> Html {
    html! {
        <div class="card">
            <h2>{ props.error.title() }</h2>
            <p>{ props.error.message() }</p>
            <button class="btn-primary" onclick={nav_button(&props.navigate, "/")}>
                { "Go home" }
            </button>
        </div>
    }
}

#[function_component(OriginPage)]
fn origin_page(props: &NavProps) -> Html {
    use_effect_with((), |_| {
        analytics::track(EVENT_ORIGIN_VIEW, None, None);
    });
    html! {
        <div class="card">
            <h1 class="hero">{ "Ask them properly 💘" }</h1>
            <p>{ "Create a Valentine link, send it, and watch them try to say no." }</p>
            <button class="btn-primary" onclick={nav_button(&props.navigate, "/create")}>
                { "Ask someone out" }
            </button>
            <button class="btn-secondary" onclick={nav_button(&props.navigate, "/my")}>
                { "My valentines" }
            </button>
        </div>
    }
}

#[function_component(CreatePage)]
fn create_page(props: &NavProps) -> Html {
    let sender_name = use_state(String::new);
    let receiver_name = use_state(String::new);
    let error = use_state_eq(|| None::<String>);
    let busy = use_state_eq(|| false);

    let on_submit = {
        let sender_name = sender_name.clone();
        let receiver_name = receiver_name.clone();
        let error = error.clone();
        let busy = busy.clone();
        let navigate = props.navigate.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if *busy {
                return;
            }
            let receiver = receiver_name.trim().to_string();
            if receiver.is_empty() {
                error.set(Some("Please enter their name".to_string()));
                return;
            }
            let sender = sender_name.trim().to_string();
            busy.set(true);
            error.set(None);
            let error = error.clone();
            let busy = busy.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                let store = record_store::shared_store();
                let origin = app_router::origin();
                let sender = (!sender.is_empty()).then_some(sender);
                let created = record_store::with_retry(|| {
                    create_valentine(store.as_ref(), sender.as_deref(), &receiver, &origin)
                })
                .await;
                match created {
                    Ok(created) => {
                        result_tokens::store_result_token(
                            created.result_token,
                            created.id,
                            &receiver,
                        );
                        sender_identity::store_sender_mapping(created.id, created.sender_token);
                        analytics::track(EVENT_VALENTINE_CREATED, Some(created.id), None);
                        navigate.emit(format!("/created/{}", created.id));
                    }
                    Err(err) => {
                        error.set(Some(PageError::from(err).message()));
                        busy.set(false);
                    }
                }
            });
        })
    };

    html! {
        <div class="card">
            <h1>{ "Create your Valentine 💌" }</h1>
            <form onsubmit={on_submit}>
                <label for="sender-name">{ "Your name (optional)" }</label>
                <input
                    id="sender-name"
                    type="text"
                    placeholder="A secret admirer"
                    value={(*sender_name).clone()}
                    oninput={input_setter(sender_name.clone())}
                />
                <label for="receiver-name">{ "Their name" }</label>
                <input
                    id="receiver-name"
                    type="text"
                    placeholder="Enter their name"
                    value={(*receiver_name).clone()}
                    oninput={input_setter(receiver_name.clone())}
                />
                if let Some(message) = (*error).clone() {
                    <p class="form-error">{ message }</p>
                }
                <button class="btn-primary" type="submit" disabled={*busy}>
                    { if *busy { "Creating..." } else { "Create Valentine" } }
                </button>
                <button
                    class="btn-secondary"
                    type="button"
                    onclick={nav_button(&props.navigate, "/")}
                >
                    { "Cancel" }
                </button>
            </form>
        </div>
    }
}

#[function_component(CreatedPage)]
fn created_page(props: &ValentineProps) -> Html {
    let token = result_tokens::result_token_for(&props.id);

    // Opened on a device that never created this one: nothing to show.
    {
        let navigate = props.navigate.clone();
        use_effect_with(token.is_none(), move |missing| {
            if *missing {
                navigate.emit("/".to_string());
            }
        });
    }
    let Some(token) = token else {
        return html! {};
    };

    let share_url = answer_url(&app_router::origin(), &props.id);
    let result_path = format!("/r/{token}");
    let on_results = {
        let navigate = props.navigate.clone();
        navigate.reform(move |_: MouseEvent| result_path.clone())
    };

    html! {
        <div class="card">
            <h1>{ "Valentine created! 💌" }</h1>
            <p>{ "Share this link with them:" }</p>
            <input class="share-link" type="text" readonly={true} value={share_url} />
            <p>{ "Want to see when they answer?" }</p>
            <button class="btn-primary" onclick={on_results}>
                { "Yes, show me! 👀" }
            </button>
            <button class="btn-secondary" onclick={nav_button(&props.navigate, "/")}>
                { "Maybe later 😌" }
            </button>
        </div>
    }
}

#[derive(Clone, PartialEq)]
enum AnswerView {
    Loading,
    Failed(PageError),
    OwnValentine { result_token: Option<ResultToken> },
    Question { valentine: Valentine },
    Answered { status: Status },
}

const ANSWER_DODGE_WINDOW_MS: f64 = 20_000.0;

#[function_component(AnswerPage)]
fn answer_page(props: &ValentineProps) -> Html {
    let view = use_state_eq(|| AnswerView::Loading);
    let yes_ref = use_node_ref();
    let answering = use_mut_ref(|| false);

    {
        let view = view.clone();
        use_effect_with(props.id, move |id| {
            let id = *id;
            let alive = Rc::new(Cell::new(true));
            let guard = alive.clone();
            spawn_local(async move {
                let store = record_store::shared_store();
                let loaded = record_store::with_retry(|| {
                    fetch_valentine(store.as_ref(), &id)
                })
                .await;
                let next = match loaded {
                    Err(err) => AnswerView::Failed(err.into()),
                    Ok(valentine) => {
                        match sender_identity::resolve_visitor(store.as_ref(), &id).await {
                            Visitor::Sender => {
                                let result_token = match result_tokens::result_token_for(&id) {
                                    Some(token) => Some(token),
                                    None => store.result_token_for(&id).await.ok(),
                                };
                                AnswerView::OwnValentine { result_token }
                            }
                            Visitor::Receiver => {
                                analytics::track(EVENT_RECEIVER_OPENED, Some(id), None);
                                if valentine.status.is_pending() {
                                    AnswerView::Question { valentine }
                                } else {
                                    AnswerView::Answered {
                                        status: valentine.status,
                                    }
                                }
                            }
                        }
                    }
                };
                if alive.get() {
                    view.set(next);
                }
            });
            move || guard.set(false)
        });
    }

    let on_answer = {
        let view = view.clone();
        let answering = answering.clone();
        let id = props.id;
        Callback::from(move |answer: Answer| {
            if *answering.borrow() {
                return;
            }
            *answering.borrow_mut() = true;
            let view = view.clone();
            let answering = answering.clone();
            spawn_local(async move {
                let store = record_store::shared_store();
                let answered_at = storage::now_iso();
                let result = record_store::with_retry(|| {
                    submit_answer(store.as_ref(), &id, answer, &answered_at)
                })
                .await;
                *answering.borrow_mut() = false;
                match result {
                    Ok(()) => {
                        let event = match answer {
                            Answer::Yes => EVENT_ANSWERED_YES,
                            Answer::No => EVENT_ANSWERED_NO,
                        };
                        analytics::track(event, Some(id), None);
                        view.set(AnswerView::Answered {
                            status: answer.status(),
                        });
                    }
                    Err(err) => view.set(AnswerView::Failed(err.into())),
                }
            });
        })
    };

    match (*view).clone() {
        AnswerView::Loading => html! {
            <div class="card"><p>{ "Loading..." }</p></div>
        },
        AnswerView::Failed(error) => html! {
            <ErrorCard navigate={props.navigate.clone()} {error} />
        },
        AnswerView::OwnValentine { result_token } => {
            let results = result_token.map(|token| {
                let navigate = props.navigate.clone();
                let path = format!("/r/{token}");
                navigate.reform(move |_: MouseEvent| path.clone())
            });
            html! {
                <div class="card">
                    <h2>{ "This Valentine is yours 💌" }</h2>
                    <p>{ "You can't answer your own question. That's cheating." }</p>
                    if let Some(on_results) = results {
                        <button class="btn-primary" onclick={on_results}>
                            { "See their answer" }
                        </button>
                    } else {
                        <p>{ "Open your result link to see their answer." }</p>
                    }
                    <button class="btn-secondary" onclick={nav_button(&props.navigate, "/")}>
                        { "Go home" }
                    </button>
                </div>
            }
        }
        AnswerView::Question { valentine } => {
            let on_yes = {
                let on_answer = on_answer.clone();
                Callback::from(move |_: MouseEvent| on_answer.emit(Answer::Yes))
            };
            let on_no = {
                let on_answer = on_answer.clone();
                Callback::from(move |_: ()| on_answer.emit(Answer::No))
            };
            let from = valentine
                .sender_name
                .clone()
                .unwrap_or_else(|| "A secret admirer".to_string());
            html! {
                <div class="card">
                    <h2>{ format!("{},", valentine.receiver_name) }</h2>
                    <h1 class="hero">{ "WILL YOU BE MY VALENTINE?" }</h1>
                    <p>{ "From: " }<strong>{ from }</strong></p>
                    <div class="answer-row">
                        <button ref={yes_ref.clone()} class="btn-primary" onclick={on_yes}>
                            { "YES! 💖" }
                        </button>
                        <DodgeButton
                            on_activate={on_no}
                            label="NO"
                            companion={yes_ref.clone()}
                            companion_label="YES! 😍"
                            total_duration_ms={ANSWER_DODGE_WINDOW_MS}
                        />
                    </div>
                </div>
            }
        }
        AnswerView::Answered { status } => {
            let (headline, line) = match status {
                Status::Yes => ("AYYYYY 😍", "You just made someone very happy 💖"),
                _ => ("Ouchh, noted 😌", "Not your type? Ask out your type..."),
            };
            html! {
                <div class="card">
                    <h1 class="hero">{ headline }</h1>
                    <p>{ line }</p>
                    <button class="btn-primary" onclick={nav_button(&props.navigate, "/create")}>
                        { "Ask someone out" }
                    </button>
                </div>
            }
        }
    }
}

#[derive(Clone, PartialEq)]
enum ResultPageView {
    Loading,
    Failed(PageError),
    StillWaiting,
    Hidden { status: Status },
    Revealed { status: Status },
}

#[function_component(ResultPage)]
fn result_page(props: &ResultProps) -> Html {
    let view = use_state_eq(|| ResultPageView::Loading);

    {
        let view = view.clone();
        use_effect_with(props.token, move |token| {
            let token = *token;
            let alive = Rc::new(Cell::new(true));
            let guard = alive.clone();
            spawn_local(async move {
                let store = record_store::shared_store();
                let loaded = record_store::with_retry(|| {
                    fetch_result(store.as_ref(), &token)
                })
                .await;
                let next = match loaded {
                    Err(err) => ResultPageView::Failed(err.into()),
                    Ok(result) => {
                        match sender_identity::check_result_access(
                            store.as_ref(),
                            &result.valentine_id,
                        )
                        .await
                        {
                            ResultAccess::Denied => {
                                ResultPageView::Failed(PageError::AccessDenied)
                            }
                            ResultAccess::Granted => {
                                analytics::track(
                                    EVENT_RESULT_VIEWED,
                                    Some(result.valentine_id),
                                    Some(serde_json::json!({ "token": token.to_string() })),
                                );
                                if result.status.is_pending() {
                                    ResultPageView::StillWaiting
                                } else {
                                    ResultPageView::Hidden {
                                        status: result.status,
                                    }
                                }
                            }
                        }
                    }
                };
                if alive.get() {
                    view.set(next);
                }
            });
            move || guard.set(false)
        });
    }

    match (*view).clone() {
        ResultPageView::Loading => html! {
            <div class="card"><p>{ "Loading..." }</p></div>
        },
        ResultPageView::Failed(error) => html! {
            <ErrorCard navigate={props.navigate.clone()} {error} />
        },
        ResultPageView::StillWaiting => html! {
            <div class="card">
                <h1 class="hero">{ "Still waiting... ⏳" }</h1>
                <p>{ "They haven't answered yet. Check back later!" }</p>
                <button class="btn-primary" onclick={nav_button(&props.navigate, "/")}>
                    { "Go home" }
                </button>
            </div>
        },
        ResultPageView::Hidden { status } => {
            let on_reveal = {
                let view = view.clone();
                Callback::from(move |_: MouseEvent| {
                    view.set(ResultPageView::Revealed { status });
                })
            };
            html! {
                <div class="card">
                    <h1 class="hero">{ "The moment of truth 👀" }</h1>
                    <p>{ "Ready to see their answer?" }</p>
                    <button class="btn-primary" onclick={on_reveal}>
                        { "Show me the result" }
                    </button>
                </div>
            }
        }
        ResultPageView::Revealed { status } => {
            let (headline, line) = match status {
                Status::Yes => ("They said YES! 🎉", "Congratulations! Time to plan that date 💖"),
                _ => (
                    "Not this time 😔",
                    "It takes courage to ask. Plenty of fish in the sea 🐠",
                ),
            };
            html! {
                <div class="card">
                    <h1 class="hero">{ headline }</h1>
                    <p>{ line }</p>
                    <button class="btn-primary" onclick={nav_button(&props.navigate, "/create")}>
                        { "Ask someone else" }
                    </button>
                </div>
            }
        }
    }
}

#[function_component(MyValentinesPage)]
fn my_valentines_page(props: &NavProps) -> Html {
    let tokens = result_tokens::stored_tokens();
    let entries: Html = tokens
        .iter()
        .rev()
        .map(|entry| {
            let navigate = props.navigate.clone();
            let path = format!("/r/{}", entry.token);
            let on_open = navigate.reform(move |_: MouseEvent| path.clone());
            let sent_on = entry.created_at.get(..10).unwrap_or("").to_string();
            html! {
                <li class="valentine-entry">
                    <span>{ format!("To {}", entry.receiver_name) }</span>
                    <span class="entry-date">{ sent_on }</span>
                    <button class="btn-secondary" onclick={on_open}>{ "See answer" }</button>
                </li>
            }
        })
        .collect();

    html! {
        <div class="card">
            <h1>{ "My valentines" }</h1>
            if tokens.is_empty() {
                <p>{ "You haven't asked anyone yet." }</p>
            } else {
                <ul class="valentine-list">{ entries }</ul>
            }
            <button class="btn-primary" onclick={nav_button(&props.navigate, "/create")}>
                { "Ask someone out" }
            </button>
        </div>
    }
}

#[function_component(NotFoundPage)]
fn not_found_page(props: &NavProps) -> Html {
    html! {
        <div class="card">
            <h2>{ "Valentine not found" }</h2>
            <p>{ "This link doesn't exist or has been removed." }</p>
            <button class="btn-primary" onclick={nav_button(&props.navigate, "/")}>
                { "Go home" }
            </button>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let route = use_state_eq(app_router::current_route);

    {
        let route = route.clone();
        use_effect_with((), move |_| {
            let listener = web_sys::window().map(|window| {
                EventListener::new(&window, "popstate", move |_| {
                    route.set(app_router::current_route());
                })
            });
            move || drop(listener)
        });
    }

    let navigate = {
        let route = route.clone();
        Callback::from(move |path: String| {
            app_router::push_path(&path);
            route.set(app_router::parse_route(&path));
        })
    };

    let page = match (*route).clone() {
        Route::Origin => html! { <OriginPage navigate={navigate.clone()} /> },
        Route::Create => html! { <CreatePage navigate={navigate.clone()} /> },
        Route::Created { id } => html! { <CreatedPage navigate={navigate.clone()} {id} /> },
        Route::Answer { id } => html! { <AnswerPage navigate={navigate.clone()} {id} /> },
        Route::Result { token } => html! { <ResultPage navigate={navigate.clone()} {token} /> },
        Route::MyValentines => html! { <MyValentinesPage navigate={navigate.clone()} /> },
        Route::NotFound => html! { <NotFoundPage navigate={navigate.clone()} /> },
    };

    html! {
        <main class="scene">
            { page }
            <footer class="footer">{ "made with 💘" }</footer>
        </main>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use wasm_bindgen_test::*;

    use barentain_core::{ServiceError, StoreError};

    use crate::error::PageError;
    use crate::storage;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn service_errors_map_to_page_errors() {
        assert_eq!(
            PageError::from(ServiceError::Validation("receiver name is required".into())),
            PageError::Validation("receiver name is required".into())
        );
        assert_eq!(
            PageError::from(ServiceError::Store(StoreError::NotFound)),
            PageError::NotFound
        );
        assert_eq!(
            PageError::from(ServiceError::Store(StoreError::Transient("http 503".into()))),
            PageError::Transient
        );
        assert_eq!(
            PageError::from(ServiceError::Store(StoreError::Invalid("http 400".into()))),
            PageError::Transient
        );
    }

    #[wasm_bindgen_test]
    fn freshness_window_is_thirty_days() {
        let now = storage::now_ms();
        assert!(storage::is_fresh(&storage::now_iso(), now));
        assert!(!storage::is_fresh("2020-01-01T00:00:00.000Z", now));
        assert!(!storage::is_fresh("not a date", now));
    }
}
