use leptos::*;

use crate::search::items_in_region;
use crate::types::{Item, Region, RegionDraft};

#[component]
pub fn RegionManagement(
    #[prop(into)] regions: Signal<Vec<Region>>,
    #[prop(into)] items: Signal<Vec<Item>>,
    on_add: Callback<RegionDraft>,
    on_update: Callback<Region>,
    on_delete: Callback<String>,
) -> impl IntoView {
    let (new_name, set_new_name) = create_signal(String::new());
    let (renaming, set_renaming) = create_signal(Option::<String>::None);
    let (rename_value, set_rename_value) = create_signal(String::new());

    let add_region = move |_| {
        let draft = RegionDraft::new(new_name.get().trim());
        if !draft.is_valid() {
            return;
        }
        on_add.call(draft);
        set_new_name.set(String::new());
    };

    let save_rename = move |id: String| {
        let draft = RegionDraft::new(rename_value.get().trim());
        if draft.is_valid() {
            on_update.call(Region { id, name: draft.name });
        }
        set_renaming.set(None);
    };

    view! {
        <div class="manage-container">
            <section class="manage-form">
                <h2>"Neues Gebiet"</h2>
                <input
                    type="text"
                    class="form-input"
                    placeholder="Name des Gebiets"
                    on:input=move |ev| set_new_name.set(event_target_value(&ev))
                    prop:value=new_name
                />
                <button class="save-btn" on:click=add_region>"Hinzufügen"</button>
            </section>

            <section class="manage-list">
                {move || {
                    let list = regions.get();
                    if list.is_empty() {
                        return view! { <p class="empty-hint">"Noch keine Gebiete"</p> }.into_view();
                    }
                    let all_items = items.get();
                    view! {
                        <ul class="region-list">
                            {list.into_iter().map(|region| {
                                let count = items_in_region(&all_items, &region.id).count();
                                let Region { id, name } = region;
                                let row_id = id.clone();
                                let is_renaming = move || renaming.get().as_deref() == Some(row_id.as_str());
                                let label = name.clone();
                                let save_id = id.clone();
                                let edit_id = id.clone();

                                view! {
                                    <li class="region-row">
                                        <Show
                                            when=is_renaming
                                            fallback=move || view! { <span class="region-name">{label.clone()}</span> }
                                        >
                                            <input
                                                type="text"
                                                class="form-input"
                                                on:input=move |ev| set_rename_value.set(event_target_value(&ev))
                                                prop:value=rename_value
                                            />
                                            <button class="save-btn" on:click={
                                                let save_id = save_id.clone();
                                                move |_| save_rename(save_id.clone())
                                            }>
                                                "Speichern"
                                            </button>
                                        </Show>
                                        <span class="region-count">{format!("{count} Artikel")}</span>
                                        <button
                                            class="edit-btn"
                                            on:click=move |_| {
                                                set_rename_value.set(name.clone());
                                                set_renaming.set(Some(edit_id.clone()));
                                            }
                                        >
                                            "Umbenennen"
                                        </button>
                                        <button class="delete-btn" on:click=move |_| on_delete.call(id.clone())>
                                            "Löschen"
                                        </button>
                                    </li>
                                }
                            }).collect_view()}
                        </ul>
                    }.into_view()
                }}
            </section>
        </div>
    }
}
