use leptos::*;

use crate::config::BackendConfig;
use crate::mutations::Mutations;
use crate::pages::{ItemManagement, ItemSearch, Landing, RegionManagement};
use crate::session::SessionController;
use crate::state::AppState;
use crate::supabase::SupabaseClient;
use crate::types::{AppView, AuthSession, AuthUser, Item, ItemDraft, Region, RegionDraft};

/// Runs an identity transition through the session controller, then drains
/// the new session's snapshots into `state` and applies the admin lookup
/// on the event loop.
fn auth_changed(
    session: StoredValue<SessionController<SupabaseClient>>,
    state: RwSignal<AppState>,
    user: Option<AuthUser>,
) {
    let mut feed = None;
    state.update(|s| session.update_value(|c| feed = c.transition(s, user)));

    let Some(mut feed) = feed else {
        return;
    };

    let lookup = session.with_value(|c| c.admin_lookup(&feed));
    let user_id = feed.user_id().to_string();
    spawn_local(async move {
        let is_admin = lookup.await;
        state.update(|s| {
            s.set_admin(&user_id, is_admin);
        });
    });

    spawn_local(async move {
        while let Some(snapshot) = feed.next().await {
            state.update(|s| {
                feed.apply(s, snapshot);
            });
        }
    });
}

#[component]
pub fn App(config: BackendConfig) -> impl IntoView {
    let client = store_value(SupabaseClient::new(config));
    let mutations = store_value(Mutations::new(client.get_value()));
    let state = create_rw_signal(AppState::default());
    let session = store_value(SessionController::new(client.get_value()));
    let (restoring, set_restoring) = create_signal(true);

    let on_auth = move |auth: Option<AuthSession>| {
        auth_changed(session, state, auth.map(|a| a.user));
    };

    // Pick up a persisted session on load
    spawn_local(async move {
        let restored = client.get_value().restore_session().await;
        if restored.is_some() {
            on_auth(restored);
        }
        set_restoring.set(false);
    });

    // A token that can no longer be refreshed ends the session
    client.with_value(|c| c.on_session_expired(move || on_auth(None)));

    on_cleanup(move || session.update_value(SessionController::stop));

    let do_sign_out = move |_| {
        spawn_local(async move {
            client.get_value().sign_out().await;
            on_auth(None);
        });
    };

    let items: Signal<Vec<Item>> = create_memo(move |_| state.with(|s| s.items().to_vec())).into();
    let regions: Signal<Vec<Region>> =
        create_memo(move |_| state.with(|s| s.regions().to_vec())).into();

    let on_add_item = Callback::new(move |draft: ItemDraft| {
        let m = mutations.get_value();
        spawn_local(async move { m.add_item(&draft).await });
    });
    let on_update_item = Callback::new(move |item: Item| {
        let m = mutations.get_value();
        spawn_local(async move { m.update_item(&item).await });
    });
    let on_delete_item = Callback::new(move |id: String| {
        let m = mutations.get_value();
        spawn_local(async move { m.delete_item(&id).await });
    });
    let on_add_region = Callback::new(move |draft: RegionDraft| {
        let m = mutations.get_value();
        spawn_local(async move { m.add_region(&draft).await });
    });
    let on_update_region = Callback::new(move |region: Region| {
        let m = mutations.get_value();
        spawn_local(async move { m.update_region(&region).await });
    });
    let on_delete_region = Callback::new(move |id: String| {
        let m = mutations.get_value();
        let current = items.get_untracked();
        spawn_local(async move { m.delete_region_detaching(&id, &current).await });
    });

    let on_signed_in = Callback::new(move |session: AuthSession| on_auth(Some(session)));
    let active_view = create_memo(move |_| state.with(AppState::active_view));

    view! {
        <div class="app">
            {move || match active_view.get() {
                AppView::Landing => {
                    if restoring.get() {
                        view! { <div class="loading">"Laden..."</div> }.into_view()
                    } else {
                        view! { <Landing client=client on_signed_in=on_signed_in /> }.into_view()
                    }
                }
                active => view! {
                    <div class="container">
                        <nav class="nav">
                            {move || state.with(|s| s.visible_tabs()).into_iter().map(|tab| {
                                let is_active = move || state.with(|s| s.tab() == tab);
                                view! {
                                    <button
                                        class=move || if is_active() { "active" } else { "" }
                                        on:click=move |_| state.update(|s| s.select_tab(tab))
                                    >
                                        {tab.label()}
                                    </button>
                                }
                            }).collect_view()}
                            <button on:click=do_sign_out>"Abmelden"</button>
                        </nav>

                        {match active {
                            AppView::Search => view! {
                                <ItemSearch items=items regions=regions />
                            }.into_view(),
                            AppView::ManageItems => view! {
                                <ItemManagement
                                    items=items
                                    regions=regions
                                    on_add=on_add_item
                                    on_update=on_update_item
                                    on_delete=on_delete_item
                                />
                            }.into_view(),
                            AppView::ManageRegions => view! {
                                <RegionManagement
                                    regions=regions
                                    items=items
                                    on_add=on_add_region
                                    on_update=on_update_region
                                    on_delete=on_delete_region
                                />
                            }.into_view(),
                            // Admin tab still selected after the flag went away
                            _ => ().into_view(),
                        }}
                    </div>
                }.into_view(),
            }}
        </div>
    }
}

/// Shown instead of the app when the build-time configuration is unusable.
#[component]
pub fn ConfigErrorNotice(message: String) -> impl IntoView {
    view! {
        <div class="config-error">
            <h2>"Konfigurationsfehler"</h2>
            <p>{message}</p>
        </div>
    }
}
