use leptos::*;

use crate::search::{filter_items, known_region, region_name, ItemQuery};
use crate::storage;
use crate::types::{Item, Region};

#[component]
pub fn ItemSearch(
    #[prop(into)] items: Signal<Vec<Item>>,
    #[prop(into)] regions: Signal<Vec<Region>>,
) -> impl IntoView {
    let (text, set_text) = create_signal(String::new());
    let (region, set_region) = create_signal(storage::load_region_filter());

    let select_region = move |value: String| {
        let value = (!value.is_empty()).then_some(value);
        storage::save_region_filter(value.as_deref());
        set_region.set(value);
    };

    // A saved filter for a region that no longer exists is ignored
    let active_region = move || regions.with(|list| known_region(list, region.get()));

    let results = move || {
        let query = ItemQuery {
            text: text.get(),
            region: active_region(),
        };
        let regions = regions.get();
        items.with(|items| {
            filter_items(items, &query)
                .into_iter()
                .map(|item| {
                    let region_label = region_name(&regions, &item.region).to_string();
                    (item.clone(), region_label)
                })
                .collect::<Vec<_>>()
        })
    };

    view! {
        <div class="search-container">
            <div class="search-controls">
                <input
                    type="search"
                    class="search-input"
                    placeholder="Artikel suchen"
                    on:input=move |ev| set_text.set(event_target_value(&ev))
                    prop:value=text
                />
                <select
                    class="region-filter"
                    on:change=move |ev| select_region(event_target_value(&ev))
                    prop:value=move || active_region().unwrap_or_default()
                >
                    <option value="">"Alle Gebiete"</option>
                    {move || {
                        let current = active_region();
                        regions.get().into_iter().map(|r| {
                            let selected = current.as_deref() == Some(r.id.as_str());
                            view! { <option value=r.id selected=selected>{r.name}</option> }
                        }).collect_view()
                    }}
                </select>
            </div>

            {move || {
                let found = results();
                if found.is_empty() {
                    view! { <p class="empty-hint">"Keine Artikel gefunden"</p> }.into_view()
                } else {
                    view! {
                        <ul class="item-list">
                            {found.into_iter().map(|(item, region_label)| view! {
                                <li class="item-row">
                                    <span class="item-name">{item.name}</span>
                                    <span class="item-region">{region_label}</span>
                                    {item.description.map(|d| view! { <span class="item-description">{d}</span> })}
                                </li>
                            }).collect_view()}
                        </ul>
                    }.into_view()
                }
            }}
        </div>
    }
}
