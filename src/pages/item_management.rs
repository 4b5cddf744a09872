use leptos::*;

use crate::search::region_name;
use crate::types::{Item, ItemDraft, Region};

fn optional(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Create, edit and delete items. Admin only.
#[component]
pub fn ItemManagement(
    #[prop(into)] items: Signal<Vec<Item>>,
    #[prop(into)] regions: Signal<Vec<Region>>,
    on_add: Callback<ItemDraft>,
    on_update: Callback<Item>,
    on_delete: Callback<String>,
) -> impl IntoView {
    let (name, set_name) = create_signal(String::new());
    let (region, set_region) = create_signal(String::new());
    let (description, set_description) = create_signal(String::new());
    // Id of the item loaded into the form; None means the form creates.
    let (editing, set_editing) = create_signal(Option::<String>::None);
    let (error, set_error) = create_signal(Option::<String>::None);

    let reset_form = move || {
        set_name.set(String::new());
        set_region.set(String::new());
        set_description.set(String::new());
        set_editing.set(None);
        set_error.set(None);
    };

    let start_edit = move |item: Item| {
        set_name.set(item.name);
        set_region.set(item.region);
        set_description.set(item.description.unwrap_or_default());
        set_editing.set(Some(item.id));
        set_error.set(None);
    };

    let submit = move |_| {
        let draft = ItemDraft {
            name: name.get().trim().to_string(),
            region: region.get(),
            description: optional(description.get()),
        };
        if !draft.is_valid() {
            set_error.set(Some("Bitte einen Namen angeben".to_string()));
            return;
        }
        match editing.get() {
            Some(id) => on_update.call(draft.with_id(&id)),
            None => on_add.call(draft),
        }
        reset_form();
    };

    view! {
        <div class="manage-container">
            <section class="manage-form">
                <h2>{move || if editing.get().is_some() { "Artikel bearbeiten" } else { "Neuer Artikel" }}</h2>

                {move || error.get().map(|e| view! { <div class="form-error">{e}</div> })}

                <input
                    type="text"
                    class="form-input"
                    placeholder="Name"
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                    prop:value=name
                />
                <select
                    class="form-input"
                    on:change=move |ev| set_region.set(event_target_value(&ev))
                    prop:value=region
                >
                    <option value="">"Kein Gebiet"</option>
                    {move || {
                        let current = region.get();
                        regions.get().into_iter().map(|r| {
                            let selected = current == r.id;
                            view! { <option value=r.id selected=selected>{r.name}</option> }
                        }).collect_view()
                    }}
                </select>
                <textarea
                    class="form-input"
                    placeholder="Beschreibung"
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                    prop:value=description
                />

                <div class="form-actions">
                    <button class="save-btn" on:click=submit>
                        {move || if editing.get().is_some() { "Speichern" } else { "Hinzufügen" }}
                    </button>
                    {move || editing.get().is_some().then(|| view! {
                        <button class="cancel-btn" on:click=move |_| reset_form()>"Abbrechen"</button>
                    })}
                </div>
            </section>

            <section class="manage-list">
                {move || {
                    let regions = regions.get();
                    let list = items.get();
                    if list.is_empty() {
                        return view! { <p class="empty-hint">"Noch keine Artikel"</p> }.into_view();
                    }
                    view! {
                        <ul class="item-list">
                            {list.into_iter().map(|item| {
                                let region_label = region_name(&regions, &item.region).to_string();
                                let id_for_delete = item.id.clone();
                                let item_for_edit = item.clone();
                                view! {
                                    <li class="item-row">
                                        <span class="item-name">{item.name}</span>
                                        <span class="item-region">{region_label}</span>
                                        <button class="edit-btn" on:click=move |_| start_edit(item_for_edit.clone())>
                                            "Bearbeiten"
                                        </button>
                                        <button class="delete-btn" on:click=move |_| on_delete.call(id_for_delete.clone())>
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
