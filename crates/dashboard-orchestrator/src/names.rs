use async_trait::async_trait;
use series_core::NameResolver;
use std::collections::HashMap;
use yahoo_client::YahooFinanceClient;

/// Well-known tickers the dashboard should label without a remote lookup.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    // KOSPI / KOSDAQ
    ("005930.KS", "Samsung Electronics"),
    ("000660.KS", "SK Hynix"),
    ("035420.KS", "Naver"),
    ("035720.KS", "Kakao"),
    ("373220.KS", "LG Energy Solution"),
    ("207940.KS", "Samsung Biologics"),
    ("005380.KS", "Hyundai Motor"),
    ("000270.KS", "Kia"),
    ("068270.KQ", "Celltrion"),
    ("005490.KS", "POSCO Holdings"),
    ("105560.KS", "KB Financial Group"),
    ("055550.KS", "Shinhan Financial"),
    ("051910.KS", "LG Chem"),
    ("006400.KS", "Samsung SDI"),
    ("012330.KS", "Hyundai Mobis"),
    ("009150.KS", "Samsung Electro-Mechanics"),
    ("036570.KS", "NCSoft"),
    ("251270.KS", "Netmarble"),
    ("323410.KS", "KakaoBank"),
    ("377300.KS", "KakaoPay"),
    ("259960.KS", "Krafton"),
    ("352820.KS", "HYBE"),
    ("096770.KS", "SK Innovation"),
    ("017670.KS", "SK Telecom"),
    ("030200.KS", "KT"),
    ("066570.KS", "LG Electronics"),
    ("012450.KS", "Hanwha Aerospace"),
    ("034020.KS", "Doosan Enerbility"),
    // US
    ("AAPL", "Apple"),
    ("MSFT", "Microsoft"),
    ("GOOGL", "Google"),
    ("AMZN", "Amazon"),
    ("META", "Meta"),
    ("TSLA", "Tesla"),
    ("NVDA", "NVIDIA"),
    ("AMD", "AMD"),
    ("INTC", "Intel"),
    ("TSM", "TSMC"),
    ("JPM", "JP Morgan"),
    ("BAC", "Bank of America"),
    ("GS", "Goldman Sachs"),
    ("MS", "Morgan Stanley"),
    ("RIVN", "Rivian"),
    ("LCID", "Lucid"),
    ("NIO", "NIO"),
];

/// Static ticker-to-name table with fallback to the ticker itself.
pub struct StaticNameTable {
    entries: HashMap<&'static str, &'static str>,
}

impl StaticNameTable {
    pub fn new() -> Self {
        Self {
            entries: DISPLAY_NAMES.iter().copied().collect(),
        }
    }

    pub fn lookup(&self, ticker: &str) -> Option<&'static str> {
        self.entries.get(ticker.to_uppercase().as_str()).copied()
    }
}

impl Default for StaticNameTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameResolver for StaticNameTable {
    async fn resolve_display_name(&self, ticker: &str) -> String {
        self.lookup(ticker)
            .map(str::to_string)
            .unwrap_or_else(|| ticker.to_uppercase())
    }
}

/// Resolver that tries the static table first, then the Yahoo search index,
/// and finally echoes the ticker. Lookup failures degrade to the ticker
/// instead of failing the request.
pub struct YahooNameResolver {
    table: StaticNameTable,
    client: YahooFinanceClient,
}

impl YahooNameResolver {
    pub fn new(client: YahooFinanceClient) -> Self {
        Self {
            table: StaticNameTable::new(),
            client,
        }
    }
}

#[async_trait]
impl NameResolver for YahooNameResolver {
    async fn resolve_display_name(&self, ticker: &str) -> String {
        if let Some(name) = self.table.lookup(ticker) {
            return name.to_string();
        }
        match self.client.lookup_short_name(ticker).await {
            Ok(Some(name)) => name,
            Ok(None) => ticker.to_uppercase(),
            Err(e) => {
                tracing::debug!("name lookup for {} failed: {}", ticker, e);
                ticker.to_uppercase()
            }
        }
    }
}
