use leptos::*;

use crate::supabase::SupabaseClient;
use crate::types::AuthSession;

const MIN_PASSWORD_LEN: usize = 6;

/// Checks the registration form before anything is sent.
pub fn validate_registration(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password != confirmation {
        return Err("Passwörter stimmen nicht überein");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Das Passwort muss mindestens 6 Zeichen lang sein");
    }
    Ok(())
}

/// Landing page for signed-out users.
#[component]
pub fn Landing(
    client: StoredValue<SupabaseClient>,
    on_signed_in: Callback<AuthSession>,
) -> impl IntoView {
    let (registering, set_registering) = create_signal(false);

    view! {
        <div class="auth-container">
            <div class="auth-logo">"INVENTAR"</div>
            {move || if registering.get() {
                view! { <Register client=client on_signed_in=on_signed_in set_registering=set_registering /> }.into_view()
            } else {
                view! { <Login client=client on_signed_in=on_signed_in set_registering=set_registering /> }.into_view()
            }}
        </div>
    }
}

#[component]
pub fn Login(
    client: StoredValue<SupabaseClient>,
    on_signed_in: Callback<AuthSession>,
    set_registering: WriteSignal<bool>,
) -> impl IntoView {
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (error, set_error) = create_signal(Option::<String>::None);
    let (loading, set_loading) = create_signal(false);

    let do_login = move |_| {
        let email = email.get();
        let password = password.get();
        set_loading.set(true);
        set_error.set(None);

        spawn_local(async move {
            match client.get_value().sign_in(&email, &password).await {
                Ok(session) => on_signed_in.call(session),
                Err(e) => {
                    set_error.set(Some(e.to_string()));
                    set_loading.set(false);
                }
            }
        });
    };

    view! {
        <div class="auth-card">
            <h2 class="auth-title">"Anmelden"</h2>

            {move || error.get().map(|e| view! { <div class="auth-error">{e}</div> })}

            <input
                type="email"
                class="auth-input"
                placeholder="E-Mail"
                on:input=move |ev| set_email.set(event_target_value(&ev))
                prop:value=email
            />

            <input
                type="password"
                class="auth-input"
                placeholder="Passwort"
                on:input=move |ev| set_password.set(event_target_value(&ev))
                prop:value=password
            />

            <button
                class="auth-button"
                on:click=do_login
                disabled=move || loading.get()
            >
                {move || if loading.get() { "Anmelden..." } else { "Anmelden" }}
            </button>

            <div class="auth-switch">
                "Noch kein Konto? "
                <button class="auth-link" on:click=move |_| set_registering.set(true)>
                    "Registrieren"
                </button>
            </div>
        </div>
    }
}

#[component]
pub fn Register(
    client: StoredValue<SupabaseClient>,
    on_signed_in: Callback<AuthSession>,
    set_registering: WriteSignal<bool>,
) -> impl IntoView {
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (password2, set_password2) = create_signal(String::new());
    let (error, set_error) = create_signal(Option::<String>::None);
    let (loading, set_loading) = create_signal(false);

    let do_register = move |_| {
        let email = email.get();
        let password = password.get();

        if let Err(msg) = validate_registration(&password, &password2.get()) {
            set_error.set(Some(msg.to_string()));
            return;
        }

        set_loading.set(true);
        set_error.set(None);

        spawn_local(async move {
            match client.get_value().sign_up(&email, &password).await {
                Ok(session) => on_signed_in.call(session),
                Err(e) => {
                    set_error.set(Some(e.to_string()));
                    set_loading.set(false);
                }
            }
        });
    };

    view! {
        <div class="auth-card">
            <h2 class="auth-title">"Konto erstellen"</h2>

            {move || error.get().map(|e| view! { <div class="auth-error">{e}</div> })}

            <input
                type="email"
                class="auth-input"
                placeholder="E-Mail"
                on:input=move |ev| set_email.set(event_target_value(&ev))
                prop:value=email
            />

            <input
                type="password"
                class="auth-input"
                placeholder="Passwort"
                on:input=move |ev| set_password.set(event_target_value(&ev))
                prop:value=password
            />

            <input
                type="password"
                class="auth-input"
                placeholder="Passwort bestätigen"
                on:input=move |ev| set_password2.set(event_target_value(&ev))
                prop:value=password2
            />

            <button
                class="auth-button"
                on:click=do_register
                disabled=move || loading.get()
            >
                {move || if loading.get() { "Konto wird erstellt..." } else { "Konto erstellen" }}
            </button>

            <div class="auth-switch">
                "Schon ein Konto? "
                <button class="auth-link" on:click=move |_| set_registering.set(false)>
                    "Anmelden"
                </button>
            </div>
        </div>
    }
}
