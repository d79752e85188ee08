//! Client-facing message texts.

use jiff::civil::Date;

/// Everything the welcome text needs about a fresh sale.
#[derive(Debug, Clone)]
pub(crate) struct WelcomeDetails<'a> {
    pub(crate) client_name: &'a str,
    pub(crate) service: &'a str,
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
    pub(crate) profile: Option<&'a str>,
    pub(crate) pin: Option<&'a str>,
    pub(crate) ends_on: Date,
}

/// Builds the activation message sent right after a sale.
pub(crate) fn welcome_message(details: &WelcomeDetails<'_>) -> String {
    let mut credentials = format!(
        "\u{1f464} Usuario: {}\n\u{1f511} Clave: {}",
        details.email, details.password
    );

    if let Some(profile) = details.profile {
        credentials.push_str(&format!("\n\u{1f4cc} Perfil: {profile}"));

        if let Some(pin) = details.pin {
            credentials.push_str(&format!(" - PIN {pin}"));
        }
    }

    format!(
        "\u{a1}Hola {}! \u{1f680} Gracias por tu pago.\n\n\
         Tu servicio de {} ha sido activado. \u{2705} \u{1f5d3} Corte: {}\n\n\
         {}\n\n\
         \u{26a0} No cambies el correo ni la clave de la cuenta.",
        details.client_name, details.service, details.ends_on, credentials
    )
}
