//! Local canned responder used when no provider answer is available.

use std::fmt::Write;

use super::gateway::{CATALOG_LIMIT, StoreDigest};

pub const DEGRADED_MARKER: &str = "[Mode dégradé]";

pub const SUMMARY_REPLY: &str = "ManiocAgri est une plateforme agricole qui relie producteurs de manioc, \
agents de terrain, livreurs et clients. Elle propose un catalogue de produits dérivés du manioc \
(gari, tapioca, farines, attiéké), la commande en ligne avec suivi par numéro de commande, \
l'affectation des livraisons et un tableau de bord adapté à chaque rôle.";

const PRICE_REPLY: &str = "Les prix dépendent du produit et sont mis à jour par les producteurs. \
Consultez le catalogue pour connaître les tarifs et le stock disponibles.";

const PREVIEW_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Summary,
    Price,
}

fn detect_intent(prompt: &str) -> Option<Intent> {
    let lowered = prompt.to_lowercase();
    const SUMMARY: [&str; 4] = ["résumé", "resume", "présente", "presente"];
    const SUMMARY_PHRASES: [&str; 1] = ["c'est quoi"];
    const PRICE: [&str; 5] = ["prix", "tarif", "combien", "coût", "cout"];

    // Keywords match at the start of a word so inflections still count.
    let starts_word = |keyword: &str| {
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word.starts_with(keyword))
    };

    if SUMMARY.iter().any(|k| starts_word(k))
        || SUMMARY_PHRASES.iter().any(|p| lowered.contains(p))
    {
        Some(Intent::Summary)
    } else if PRICE.iter().any(|k| starts_word(k)) {
        Some(Intent::Price)
    } else {
        None
    }
}

pub fn degraded_reply(prompt: &str, digest: Option<&StoreDigest>) -> String {
    match detect_intent(prompt) {
        Some(Intent::Summary) => SUMMARY_REPLY.to_string(),
        Some(Intent::Price) => price_reply(digest),
        None => format!(
            "{DEGRADED_MARKER} L'assistant n'est pas disponible pour le moment. Votre message : « {} »",
            preview(prompt)
        ),
    }
}

fn price_reply(digest: Option<&StoreDigest>) -> String {
    let products = match digest {
        Some(d) if !d.products.is_empty() => &d.products,
        _ => return PRICE_REPLY.to_string(),
    };

    let mut reply = String::from("Prix actuels du catalogue :\n");
    for product in products.iter().take(CATALOG_LIMIT) {
        let _ = writeln!(
            reply,
            "- {} : {} FCFA (stock {})",
            product.name, product.price, product.stock_quantity
        );
    }
    reply
}

/// At most `PREVIEW_LIMIT` characters, cut on a char boundary.
pub fn preview(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.chars().count() <= PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(PREVIEW_LIMIT - 3).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gateway::ProductDigest;

    #[test]
    fn summary_intent() {
        assert_eq!(
            degraded_reply("Donne-moi un résumé de la plateforme", None),
            SUMMARY_REPLY
        );
    }

    #[test]
    fn price_intent_uses_catalog_when_known() {
        let digest = StoreDigest {
            products: vec![ProductDigest {
                name: "Gari".into(),
                price: 600,
                stock_quantity: 200,
            }],
            recent_orders: 0,
        };
        let reply = degraded_reply("Quel est le prix du gari ?", Some(&digest));
        assert!(reply.contains("Gari : 600 FCFA"));

        assert_eq!(degraded_reply("Combien ça coûte ?", None), PRICE_REPLY);
        assert_eq!(degraded_reply("Vos tarifs pour le tapioca", None), PRICE_REPLY);
    }

    #[test]
    fn keywords_inside_other_words_are_ignored() {
        for prompt in ["Je veux écouter la radio", "Qui représente la coopérative ?"] {
            assert!(degraded_reply(prompt, None).starts_with(DEGRADED_MARKER), "{prompt}");
        }
        assert_eq!(degraded_reply("C'est quoi ManiocAgri ?", None), SUMMARY_REPLY);
    }

    #[test]
    fn unknown_intent_echoes_bounded_preview() {
        let long = "é".repeat(500);
        let reply = degraded_reply(&long, None);
        assert!(reply.starts_with(DEGRADED_MARKER));
        assert_eq!(preview(&long).chars().count(), PREVIEW_LIMIT);
        assert_eq!(preview("  court  "), "court");
    }
}
