//! Leitura de configuração do ambiente (com `.env`)
//!
//! Os valores vêm do ambiente do processo, depois de carregar uma única vez o
//! `.env` do diretório de trabalho. Toda chave usada pelo haunt começa com
//! [`PREFIX`].

use std::env;
use std::str::FromStr;

use once_cell::sync::Lazy;

/// Prefixo comum a todas as variáveis do haunt
pub const PREFIX: &str = "HAUNT_";

// Carrega o .env no primeiro uso do módulo
static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

/// Garante que o .env foi carregado
#[inline]
fn ensure_loaded() {
    let _ = &*DOTENV_INIT;
}

/// Valor bruto de `key` (já com prefixo), se definido e não vazio
pub fn var(key: &str) -> Option<String> {
    ensure_loaded();
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Valor de `key` convertido; valores inválidos são ignorados
pub fn parse<T: FromStr>(key: &str) -> Option<T> {
    var(key).and_then(|v| v.parse().ok())
}

/// Nome completo da variável para uma chave curta (`"IDLE_FAR_CM"` → `"HAUNT_IDLE_FAR_CM"`)
pub fn key(name: &str) -> String {
    format!("{}{}", PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix() {
        assert_eq!(key("IDLE_FAR_CM"), "HAUNT_IDLE_FAR_CM");
    }

    #[test]
    fn test_missing_variable() {
        assert_eq!(var("HAUNT_TEST_SURELY_UNSET_VARIABLE"), None);
        assert_eq!(parse::<f64>("HAUNT_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
