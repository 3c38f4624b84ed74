/// Options page: unread comment color and follow behaviour

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use patternfly_yew::prelude::*;
use crate::chrome_store::ChromeRepository;
use crate::settings::{is_valid_hex_color, Settings, DEFAULT_UNREAD_COMMENT_COLOR};
use crate::storage::{load_settings, save_settings};
use crate::ui::components::{StatusKind, StatusModal};

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Idle,
    Saved,
    Error(String),
}

#[function_component(OptionsHome)]
pub fn options_home() -> Html {
    let state = use_state(|| ViewState::Loading);
    let settings = use_state(Settings::default);

    // Initialise from whatever is already in storage
    {
        let state = state.clone();
        let settings = settings.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                match load_settings(&ChromeRepository::new()).await {
                    Ok(loaded) => {
                        settings.set(loaded);
                        state.set(ViewState::Idle);
                    }
                    Err(e) => {
                        state.set(ViewState::Error(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    let persist = {
        let state = state.clone();
        let settings = settings.clone();

        Callback::from(move |updated: Settings| {
            let state = state.clone();
            let settings = settings.clone();

            spawn_local(async move {
                match save_settings(&ChromeRepository::new(), &updated).await {
                    Ok(saved) => {
                        settings.set(saved);
                        state.set(ViewState::Saved);
                    }
                    Err(e) => {
                        log::warn!("Failed to save settings: {}", e);
                        state.set(ViewState::Error("Error saving to storage".to_string()));
                    }
                }
            });
        })
    };

    // Color picker handler
    let on_color_change = {
        let settings = settings.clone();
        let persist = persist.clone();

        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                let color = input.value();
                if is_valid_hex_color(&color) {
                    persist.emit(Settings {
                        unread_comment_color: color,
                        ..(*settings).clone()
                    });
                }
            }
        })
    };

    // Auto-follow toggle handler
    let on_auto_follow_change = {
        let settings = settings.clone();
        let persist = persist.clone();

        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                persist.emit(Settings {
                    auto_follow: input.checked(),
                    ..(*settings).clone()
                });
            }
        })
    };

    // Restore defaults handler
    let on_restore_defaults = {
        let persist = persist.clone();
        Callback::from(move |_: MouseEvent| {
            persist.emit(Settings::default());
        })
    };

    let on_status_close = {
        let state = state.clone();
        Callback::from(move |_: ()| state.set(ViewState::Idle))
    };

    html! {
        <div class="wrapper">
            <header class="options-header">
                <h1 class="main-title">{"rereaddit extension settings"}</h1>
                <p class="italic">{"Never lose track of new reddit comments"}</p>
            </header>

            {match &*state {
                ViewState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                },
                ViewState::Saved => html! {
                    <StatusModal
                        message={"Settings saved".to_string()}
                        kind={StatusKind::Success}
                        on_close={on_status_close.clone()}
                    />
                },
                ViewState::Error(err) => html! {
                    <StatusModal message={err.clone()} on_close={on_status_close.clone()} />
                },
                ViewState::Idle => html! {}
            }}

            <div class="container">
                <div class="text-center">
                    <Button onclick={on_restore_defaults} variant={ButtonVariant::Danger}>
                        {"Restore Defaults"}
                    </Button>
                </div>

                <h3 class="section-title">{"General"}</h3>

                <div class="setting-row">
                    <label for="unread-color">{"Unread comment color"}</label>
                    <input
                        id="unread-color"
                        type="color"
                        value={settings.unread_comment_color.clone()}
                        onchange={on_color_change}
                    />
                    <span class="setting-hint">
                        {format!("Default {}", DEFAULT_UNREAD_COMMENT_COLOR)}
                    </span>
                </div>

                <div class="setting-row">
                    <label for="auto-follow">{"Follow threads automatically on first visit"}</label>
                    <input
                        id="auto-follow"
                        type="checkbox"
                        checked={settings.auto_follow}
                        onchange={on_auto_follow_change}
                    />
                </div>
            </div>
        </div>
    }
}
