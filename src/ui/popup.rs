/// Popup UI: viewing history and storage settings

use std::rc::Rc;

use yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use patternfly_yew::prelude::*;
use chrono::Utc;
use crate::chrome_store::ChromeRepository;
use crate::fetch::{refresh_unread_counts, RedditClient};
use crate::history::{
    filter_threads, shorten_title, sort_threads, time_ago, Direction, SortColumn, SortState,
};
use crate::settings::{RetentionFrequency, Settings};
use crate::storage::{load_settings, load_tracked_threads, save_settings};
use crate::tracked::TrackedThread;
use crate::tracker::{clear_history, unfollow_thread};
use crate::ui::components::StatusModal;

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn openTab(url: &str) -> Result<(), JsValue>;
}

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Counting,
    Idle,
    Error(String),
}

/// The threads shown in the history table
#[derive(Debug, Clone, Default, PartialEq)]
struct ThreadList {
    threads: Vec<TrackedThread>,
}

enum ThreadAction {
    Loaded(Vec<TrackedThread>),
    /// Fresh unread counts, applied only to threads still listed
    Counted(Vec<TrackedThread>),
    Removed(String),
    Cleared,
}

impl Reducible for ThreadList {
    type Action = ThreadAction;

    fn reduce(self: Rc<Self>, action: ThreadAction) -> Rc<Self> {
        let threads = match action {
            ThreadAction::Loaded(threads) => threads,
            ThreadAction::Counted(counted) => self
                .threads
                .iter()
                .map(|thread| {
                    let mut thread = thread.clone();
                    if let Some(fresh) = counted.iter().find(|c| c.thread_id == thread.thread_id) {
                        thread.unread_count = fresh.unread_count;
                    }
                    thread
                })
                .collect(),
            ThreadAction::Removed(thread_id) => self
                .threads
                .iter()
                .filter(|thread| thread.thread_id != thread_id)
                .cloned()
                .collect(),
            ThreadAction::Cleared => Vec::new(),
        };
        Rc::new(ThreadList { threads })
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| ViewState::Loading);
    let threads = use_reducer(ThreadList::default);
    let settings = use_state(Settings::default);
    let sort = use_state(SortState::default);
    let search_query = use_state(String::new);

    // Load history on mount, then count unread comments per thread
    {
        let state = state.clone();
        let threads = threads.clone();
        let settings = settings.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let repo = ChromeRepository::new();

                match load_settings(&repo).await {
                    Ok(loaded) => settings.set(loaded),
                    Err(e) => log::warn!("Using default settings: {}", e),
                }

                match load_tracked_threads(&repo).await {
                    Ok(loaded) => {
                        threads.dispatch(ThreadAction::Loaded(loaded.clone()));
                        state.set(ViewState::Counting);

                        let counted = refresh_unread_counts(&RedditClient::new(), loaded).await;
                        threads.dispatch(ThreadAction::Counted(counted));
                        state.set(ViewState::Idle);
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load history: {}", e)));
                    }
                }
            });
            || ()
        });
    }

    // Sort handler
    let on_sort = {
        let sort = sort.clone();
        move |column: SortColumn| {
            let sort = sort.clone();
            Callback::from(move |_: MouseEvent| {
                sort.set(sort.toggle(column));
            })
        }
    };

    // Search handler
    let on_search_input = {
        let search_query = search_query.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                search_query.set(input.value());
            }
        })
    };

    // Unfollow handler
    let on_unfollow = {
        let threads = threads.clone();
        let state = state.clone();

        Callback::from(move |thread_id: String| {
            let threads = threads.clone();
            let state = state.clone();

            spawn_local(async move {
                match unfollow_thread(&ChromeRepository::new(), &thread_id).await {
                    Ok(_) => threads.dispatch(ThreadAction::Removed(thread_id)),
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to unfollow: {}", e)));
                    }
                }
            });
        })
    };

    // Clear all history handler
    let on_clear_all = {
        let threads = threads.clone();
        let state = state.clone();

        Callback::from(move |_: MouseEvent| {
            let threads = threads.clone();
            let state = state.clone();

            spawn_local(async move {
                match clear_history(&ChromeRepository::new()).await {
                    Ok(true) => threads.dispatch(ThreadAction::Cleared),
                    Ok(false) => {
                        let message = "Some history could not be deleted".to_string();
                        state.set(ViewState::Error(message));
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to clear history: {}", e)));
                    }
                }
            });
        })
    };

    // Retention frequency handler
    let on_frequency_change = {
        let settings = settings.clone();
        let state = state.clone();

        Callback::from(move |e: Event| {
            let Some(select) = e.target_dyn_into::<HtmlSelectElement>() else {
                return;
            };
            let Some(frequency) = RetentionFrequency::from_key(&select.value()) else {
                return;
            };

            let updated = Settings {
                delete_frequency: frequency,
                ..(*settings).clone()
            };
            let settings = settings.clone();
            let state = state.clone();

            spawn_local(async move {
                match save_settings(&ChromeRepository::new(), &updated).await {
                    Ok(saved) => settings.set(saved),
                    Err(e) => state.set(ViewState::Error(format!("Failed to save setting: {}", e))),
                }
            });
        })
    };

    let on_open = Callback::from(move |url: String| {
        spawn_local(async move {
            if let Err(e) = openTab(&url).await {
                log::warn!("Failed to open {}: {:?}", url, e);
            }
        });
    });

    let on_error_close = {
        let state = state.clone();
        Callback::from(move |_: ()| state.set(ViewState::Idle))
    };

    let visible = sort_threads(&filter_threads(&threads.threads, &search_query), *sort);
    let now = Utc::now();
    let is_busy = matches!(*state, ViewState::Loading);

    let header_class = |column: SortColumn| match (sort.column == column, sort.direction) {
        (true, Direction::Ascending) => "sortable sorted ascending",
        (true, Direction::Descending) => "sortable sorted descending",
        (false, _) => "sortable",
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"rereaddit"}</h1>
            <p class="popup-subtitle">{"Manage unread reddit comments"}</p>

            // Status display
            {match &*state {
                ViewState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading viewing history..."}</p>
                    </div>
                },
                ViewState::Counting => html! {
                    <p class="message-text">{"Counting unread comments..."}</p>
                },
                ViewState::Error(err) => html! {
                    <StatusModal message={err.clone()} on_close={on_error_close.clone()} />
                },
                ViewState::Idle => html! {}
            }}

            // Viewing history
            <div id="viewing-history">
                <h3 class="section-title">
                    {format!("Viewing History ({})", threads.threads.len())}
                </h3>

                <input
                    type="text"
                    placeholder="Search titles or subreddits..."
                    value={(*search_query).clone()}
                    oninput={on_search_input}
                    class="search-input"
                />

                if !visible.is_empty() {
                    <table class="history-table">
                        <thead>
                            <tr>
                                <th
                                    class={header_class(SortColumn::Title)}
                                    onclick={on_sort(SortColumn::Title)}
                                >
                                    {"Title"}
                                </th>
                                <th
                                    class={header_class(SortColumn::Subreddit)}
                                    onclick={on_sort(SortColumn::Subreddit)}
                                >
                                    {"Sub"}
                                </th>
                                <th
                                    class={header_class(SortColumn::LastViewed)}
                                    onclick={on_sort(SortColumn::LastViewed)}
                                >
                                    {"Last viewed"}
                                </th>
                                <th
                                    class={header_class(SortColumn::UnreadCount)}
                                    onclick={on_sort(SortColumn::UnreadCount)}
                                >
                                    {"# Unread"}
                                </th>
                                <th>{"Unfollow"}</th>
                            </tr>
                        </thead>
                        <tbody>
                            {for visible.iter().map(|thread| {
                                let thread_url = thread.url();
                                let open_thread = {
                                    let url = thread_url.clone();
                                    on_open.reform(move |e: MouseEvent| {
                                        e.prevent_default();
                                        url.clone()
                                    })
                                };
                                let subreddit_link = thread.subreddit_url().map(|url| {
                                    let target = url.clone();
                                    let open = on_open.reform(move |e: MouseEvent| {
                                        e.prevent_default();
                                        target.clone()
                                    });
                                    (url, open)
                                });
                                let thread_id = thread.thread_id.clone();
                                let unfollow =
                                    on_unfollow.reform(move |_: MouseEvent| thread_id.clone());

                                html! {
                                    <tr key={thread.thread_id.clone()}>
                                        <td>
                                            <a href={thread_url} onclick={open_thread}>
                                                {shorten_title(&thread.title)}
                                            </a>
                                        </td>
                                        <td>
                                            if let Some((url, open_subreddit)) = subreddit_link {
                                                <a href={url} onclick={open_subreddit}>
                                                    {format!("r/{}", thread.subreddit_name)}
                                                </a>
                                            }
                                        </td>
                                        <td>{time_ago(thread.last_viewed_at, now)}</td>
                                        <td>{thread.unread_count}</td>
                                        <td>
                                            <Button
                                                onclick={unfollow}
                                                variant={ButtonVariant::Danger}
                                                size={ButtonSize::Small}
                                            >
                                                {"Unfollow"}
                                            </Button>
                                        </td>
                                    </tr>
                                }
                            })}
                        </tbody>
                    </table>
                } else if !threads.threads.is_empty() {
                    <p class="empty-state">{"No threads match your search."}</p>
                }
            </div>

            // Storage settings
            <div class="storage-settings">
                <h3 class="section-title">{"Storage"}</h3>
                <div class="setting-row">
                    <label for="delete-frequency">{"Delete history not viewed in"}</label>
                    <select id="delete-frequency" onchange={on_frequency_change}>
                        {for RetentionFrequency::ALL.iter().map(|frequency| html! {
                            <option
                                value={frequency.as_key()}
                                selected={*frequency == settings.delete_frequency}
                            >
                                {frequency.label()}
                            </option>
                        })}
                    </select>
                </div>
                <div class="setting-row">
                    <p>{"Clear all viewing history"}</p>
                    <Button
                        onclick={on_clear_all}
                        disabled={is_busy || threads.threads.is_empty()}
                        variant={ButtonVariant::Danger}
                    >
                        {"Delete"}
                    </Button>
                </div>
            </div>

            <p class="footer-popup">
                {"rereaddit v0.1.0"}
            </p>
        </div>
    }
}
