use shared::{
    Backend, BackendInfo, ChatRequest, ChatSettings, ProfileResponse, Transcript,
    MAX_TOKENS_RANGE, TEMPERATURE_RANGE,
};
use uuid::Uuid;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

mod rpc;

/// Models to offer for `backend`: the live Ollama list when there is one,
/// the catalog otherwise.
fn model_choices(info: Option<&BackendInfo>, backend: Backend, live: &[String]) -> Vec<String> {
    if backend == Backend::Ollama && !live.is_empty() {
        return live.to_vec();
    }
    info.map(|info| info.models.clone()).unwrap_or_default()
}

fn backend_info(profile: &Option<ProfileResponse>, backend: Backend) -> Option<&BackendInfo> {
    profile
        .as_ref()
        .and_then(|p| p.backends.iter().find(|info| info.backend == backend))
}

#[function_component]
fn App() -> Html {
    let input_ref = use_node_ref();

    let session = use_state(Uuid::new_v4);
    let profile: UseStateHandle<Option<ProfileResponse>> = use_state(|| None);
    let settings = use_state(|| ChatSettings::for_backend(Backend::OpenAi));
    let live_models: UseStateHandle<Vec<String>> = use_state(Vec::new);
    let transcript = use_state(Transcript::new);
    let error: UseStateHandle<Option<String>> = use_state(|| None);
    let pending = use_state(|| false);

    {
        let profile = profile.clone();
        let settings = settings.clone();
        let live_models = live_models.clone();
        let error = error.clone();

        use_effect_with_deps(
            move |_| {
                wasm_bindgen_futures::spawn_local(async move {
                    match rpc::profile().await {
                        Ok(p) => {
                            let mut defaults = p.defaults.clone();
                            settings.set(defaults.clone());
                            let wants_local = p.backends.iter().any(|b| b.backend == Backend::Ollama);
                            profile.set(Some(p));

                            if wants_local {
                                if let Ok(models) = rpc::local_models().await {
                                    if defaults.backend == Backend::Ollama.as_str() {
                                        defaults.prefer_available_model(&models);
                                        settings.set(defaults);
                                    }
                                    live_models.set(models);
                                }
                            }
                        }
                        Err(e) => error.set(Some(format!("Could not load settings: {e}"))),
                    }
                });
            },
            (),
        );
    }

    let backend = settings.backend.parse::<Backend>().unwrap_or(Backend::OpenAi);
    let models = model_choices(backend_info(&profile, backend), backend, &live_models);

    let on_backend = {
        let settings = settings.clone();
        let profile = profile.clone();
        let live_models = live_models.clone();

        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            let Ok(backend) = value.parse::<Backend>() else {
                return
            };

            let mut next = (*settings).clone();
            next.backend = backend.as_str().to_string();
            next.model = model_choices(backend_info(&profile, backend), backend, &live_models)
                .into_iter()
                .next()
                .unwrap_or_else(|| backend.default_model().to_string());
            if !backend.is_hosted() {
                next.credential = None;
            }
            settings.set(next);
        })
    };

    let on_model = {
        let settings = settings.clone();
        Callback::from(move |e: Event| {
            let mut next = (*settings).clone();
            next.model = e.target_unchecked_into::<HtmlSelectElement>().value();
            settings.set(next);
        })
    };

    let on_temperature = {
        let settings = settings.clone();
        Callback::from(move |e: InputEvent| {
            let value = e.target_unchecked_into::<HtmlInputElement>().value();
            if let Ok(temperature) = value.parse::<f32>() {
                let mut next = (*settings).clone();
                next.temperature = temperature;
                settings.set(next);
            }
        })
    };

    let on_max_tokens = {
        let settings = settings.clone();
        Callback::from(move |e: InputEvent| {
            let value = e.target_unchecked_into::<HtmlInputElement>().value();
            if let Ok(max_tokens) = value.parse::<u32>() {
                let mut next = (*settings).clone();
                next.max_tokens = max_tokens;
                settings.set(next);
            }
        })
    };

    let on_credential = {
        let settings = settings.clone();
        Callback::from(move |e: InputEvent| {
            let value = e.target_unchecked_into::<HtmlInputElement>().value();
            let mut next = (*settings).clone();
            next.credential = Some(value).filter(|v| !v.is_empty());
            settings.set(next);
        })
    };

    let on_submit = {
        let input_ref = input_ref.clone();
        let session = session.clone();
        let settings = settings.clone();
        let transcript = transcript.clone();
        let error = error.clone();
        let pending = pending.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();

            let Some(input) = input_ref.cast::<HtmlInputElement>() else {
                return
            };
            let question = input.value();
            if question.trim().is_empty() {
                return;
            }
            input.set_value("");

            let req = ChatRequest {
                session: *session,
                question,
                settings: (*settings).clone(),
            };
            let transcript = transcript.clone();
            let error = error.clone();
            let pending = pending.clone();
            pending.set(true);

            wasm_bindgen_futures::spawn_local(async move {
                match rpc::chat(&req).await {
                    Ok(Ok(resp)) => {
                        transcript.set(resp.transcript);
                        error.set(None);
                    }
                    Ok(Err(failure)) => {
                        transcript.set(failure.transcript);
                        error.set(Some(failure.message));
                    }
                    Err(e) => error.set(Some(e)),
                }
                pending.set(false);
            });
        })
    };

    let on_clear = {
        let session = session.clone();
        let transcript = transcript.clone();
        let error = error.clone();

        Callback::from(move |_: MouseEvent| {
            let id = *session;
            let transcript = transcript.clone();
            let error = error.clone();

            wasm_bindgen_futures::spawn_local(async move {
                match rpc::clear_session(id).await {
                    Ok(()) => {
                        transcript.set(Transcript::new());
                        error.set(None);
                    }
                    Err(e) => error.set(Some(e)),
                }
            });
        })
    };

    let (title, greeting, backends) = match profile.as_ref() {
        Some(p) => (p.title.clone(), p.greeting.clone(), p.backends.clone()),
        None => (String::from("Q&A Chatbot"), String::new(), Vec::new()),
    };
    let needs_key = backend.is_hosted();

    html! {
        <div class="app">
            <aside class="sidebar">
                <h2>{ "⚙️ Settings" }</h2>

                if backends.len() > 1 {
                    <label>{ "Select backend" }</label>
                    <select onchange={on_backend}>
                        { for backends.iter().map(|info| html! {
                            <option
                                value={info.backend.as_str()}
                                selected={info.backend == backend}
                            >
                                { info.label.clone() }
                            </option>
                        }) }
                    </select>
                }

                if needs_key {
                    <label>{ format!("Enter your {} API Key:", backend.display_name()) }</label>
                    <input
                        type="password"
                        value={settings.credential.clone().unwrap_or_default()}
                        oninput={on_credential}
                    />
                }

                <label>{ format!("Select {} model", backend.display_name()) }</label>
                <select onchange={on_model}>
                    { for models.iter().map(|model| html! {
                        <option value={model.clone()} selected={*model == settings.model}>
                            { model.clone() }
                        </option>
                    }) }
                </select>

                <label>{ format!("Temperature: {:.2}", settings.temperature) }</label>
                <input
                    type="range"
                    min={TEMPERATURE_RANGE.start().to_string()}
                    max={TEMPERATURE_RANGE.end().to_string()}
                    step="0.01"
                    value={settings.temperature.to_string()}
                    oninput={on_temperature}
                />

                <label>{ format!("Max Tokens: {}", settings.max_tokens) }</label>
                <input
                    type="range"
                    min={MAX_TOKENS_RANGE.start().to_string()}
                    max={MAX_TOKENS_RANGE.end().to_string()}
                    step="1"
                    value={settings.max_tokens.to_string()}
                    oninput={on_max_tokens}
                />
            </aside>

            <main>
                <h1>{ format!("💬 {title}") }</h1>
                <p>{ format!("🤖 {greeting}") }</p>

                <form onsubmit={on_submit}>
                    <input ref={input_ref} type="text" placeholder="You:" disabled={*pending} />
                    <button type="submit" disabled={*pending}>{ "Send" }</button>
                    <button type="button" onclick={on_clear}>{ "New chat" }</button>
                </form>

                if *pending {
                    <p class="pending">{ "Thinking..." }</p>
                }

                if let Some(message) = error.as_ref() {
                    <div class="error">{ format!("⚠️ Error: {message}") }</div>
                }

                <div class="transcript">
                    { for transcript.entries().iter().map(|entry| html! {
                        <p>
                            <strong>{ format!("{}:", entry.sender.label()) }</strong>
                            { " " }
                            { entry.text.clone() }
                        </p>
                    }) }
                </div>
            </main>
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
