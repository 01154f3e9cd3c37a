//! Static lookup tables for entity aliases and sector keywords
//!
//! Both tables are built once at startup, shared behind `Arc`, and injected
//! into the classifier and resolver. Nothing mutates them at runtime, and
//! tests substitute smaller fixtures through the same constructors.

use std::collections::HashMap;
use std::sync::Arc;

/// Alias entries: normalized company name → NSE ticker
///
/// Multiple aliases per ticker handle common short forms ("sbi",
/// "state bank") alongside full names.
const SYMBOL_ALIASES: &[(&str, &str)] = &[
    // IT sector
    ("tata consultancy services", "TCS"),
    ("tcs", "TCS"),
    ("infosys", "INFY"),
    ("infy", "INFY"),
    ("wipro", "WIPRO"),
    ("hcl technologies", "HCLTECH"),
    ("hcltech", "HCLTECH"),
    ("hcl tech", "HCLTECH"),
    ("tech mahindra", "TECHM"),
    ("techm", "TECHM"),
    ("ltimindtree", "LTIM"),
    ("l&t infotech", "LTIM"),
    ("mphasis", "MPHASIS"),
    ("persistent", "PERSISTENT"),
    ("coforge", "COFORGE"),
    // Banking sector
    ("hdfc bank", "HDFCBANK"),
    ("hdfcbank", "HDFCBANK"),
    ("icici bank", "ICICIBANK"),
    ("icicibank", "ICICIBANK"),
    ("state bank", "SBIN"),
    ("sbi", "SBIN"),
    ("axis bank", "AXISBANK"),
    ("axisbank", "AXISBANK"),
    ("kotak mahindra", "KOTAKBANK"),
    ("kotakbank", "KOTAKBANK"),
    ("kotak bank", "KOTAKBANK"),
    ("indusind bank", "INDUSINDBK"),
    ("indusindbk", "INDUSINDBK"),
    ("federal bank", "FEDERALBNK"),
    ("bandhan bank", "BANDHANBNK"),
    ("idfc first", "IDFCFIRSTB"),
    ("yes bank", "YESBANK"),
    ("bank of baroda", "BANKBARODA"),
    ("punjab national", "PNB"),
    ("pnb", "PNB"),
    ("canara bank", "CANBK"),
    // Auto sector
    ("tata motors", "TATAMOTORS"),
    ("tatamotors", "TATAMOTORS"),
    ("maruti", "MARUTI"),
    ("maruti suzuki", "MARUTI"),
    ("mahindra", "M&M"),
    ("m&m", "M&M"),
    ("bajaj auto", "BAJAJ-AUTO"),
    ("hero motocorp", "HEROMOTOCO"),
    ("eicher motors", "EICHERMOT"),
    ("tvs motor", "TVSMOTOR"),
    ("ashok leyland", "ASHOKLEY"),
    // Oil & gas
    ("reliance", "RELIANCE"),
    ("reliance industries", "RELIANCE"),
    ("ongc", "ONGC"),
    ("oil and natural gas", "ONGC"),
    ("indian oil", "IOC"),
    ("ioc", "IOC"),
    ("bpcl", "BPCL"),
    ("bharat petroleum", "BPCL"),
    ("hpcl", "HPCL"),
    ("hindustan petroleum", "HPCL"),
    ("gail", "GAIL"),
    ("petronet lng", "PETRONET"),
    // Pharma & healthcare
    ("sun pharma", "SUNPHARMA"),
    ("sunpharma", "SUNPHARMA"),
    ("dr reddy", "DRREDDY"),
    ("drreddy", "DRREDDY"),
    ("cipla", "CIPLA"),
    ("divi's lab", "DIVISLAB"),
    ("divislab", "DIVISLAB"),
    ("lupin", "LUPIN"),
    ("aurobindo pharma", "AUROPHARMA"),
    ("biocon", "BIOCON"),
    ("torrent pharma", "TORNTPHARM"),
    ("alkem", "ALKEM"),
    ("apollo hospitals", "APOLLOHOSP"),
    ("fortis healthcare", "FORTIS"),
    ("max healthcare", "MAXHEALTH"),
    // FMCG
    ("hindustan unilever", "HINDUNILVR"),
    ("hindunilvr", "HINDUNILVR"),
    ("hul", "HINDUNILVR"),
    ("itc", "ITC"),
    ("nestle", "NESTLEIND"),
    ("nestle india", "NESTLEIND"),
    ("britannia", "BRITANNIA"),
    ("dabur", "DABUR"),
    ("godrej consumer", "GODREJCP"),
    ("marico", "MARICO"),
    ("colgate", "COLPAL"),
    ("tata consumer", "TATACONSUM"),
    ("varun beverages", "VBL"),
    // Metals & mining
    ("tata steel", "TATASTEEL"),
    ("tatasteel", "TATASTEEL"),
    ("jsw steel", "JSWSTEEL"),
    ("jswsteel", "JSWSTEEL"),
    ("hindalco", "HINDALCO"),
    ("vedanta", "VEDL"),
    ("vedl", "VEDL"),
    ("coal india", "COALINDIA"),
    ("nmdc", "NMDC"),
    ("sail", "SAIL"),
    ("jindal steel", "JINDALSTEL"),
    // Infrastructure & construction
    ("larsen", "LT"),
    ("l&t", "LT"),
    ("larsen & toubro", "LT"),
    ("adani ports", "ADANIPORTS"),
    ("adaniports", "ADANIPORTS"),
    ("adani enterprises", "ADANIENT"),
    ("adanient", "ADANIENT"),
    ("adani green", "ADANIGREEN"),
    ("adani power", "ADANIPOWER"),
    ("adani total gas", "ATGL"),
    ("ultratech", "ULTRACEMCO"),
    ("ultracemco", "ULTRACEMCO"),
    ("ultratech cement", "ULTRACEMCO"),
    ("shree cement", "SHREECEM"),
    ("ambuja cement", "AMBUJACEM"),
    ("acc", "ACC"),
    ("dlf", "DLF"),
    ("godrej properties", "GODREJPROP"),
    ("oberoi realty", "OBEROIRLTY"),
    // Telecom
    ("bharti airtel", "BHARTIARTL"),
    ("bhartiartl", "BHARTIARTL"),
    ("airtel", "BHARTIARTL"),
    ("jio", "RELIANCE"),
    ("vodafone idea", "IDEA"),
    ("idea", "IDEA"),
    // Finance & insurance
    ("bajaj finance", "BAJFINANCE"),
    ("bajfinance", "BAJFINANCE"),
    ("bajaj finserv", "BAJAJFINSV"),
    ("hdfc life", "HDFCLIFE"),
    ("sbi life", "SBILIFE"),
    ("icici prudential", "ICICIPRULI"),
    ("lic housing", "LICHSGFIN"),
    ("hdfc amc", "HDFCAMC"),
    ("sbi card", "SBICARD"),
    ("muthoot finance", "MUTHOOTFIN"),
    ("cholamandalam", "CHOLAFIN"),
    ("shriram finance", "SHRIRAMFIN"),
    // Power & utilities
    ("ntpc", "NTPC"),
    ("power grid", "POWERGRID"),
    ("powergrid", "POWERGRID"),
    ("tata power", "TATAPOWER"),
    ("tatapower", "TATAPOWER"),
    ("jsw energy", "JSWENERGY"),
    ("nhpc", "NHPC"),
    ("torrent power", "TORNTPOWER"),
    // Chemicals & paints
    ("pidilite", "PIDILITIND"),
    ("asian paints", "ASIANPAINT"),
    ("asianpaint", "ASIANPAINT"),
    ("berger paints", "BERGEPAINT"),
    ("srf", "SRF"),
    ("upl", "UPL"),
    ("coromandel", "COROMANDEL"),
    ("aarti industries", "AARTIIND"),
    // Defence & aerospace
    ("hindustan aeronautics", "HAL"),
    ("hal", "HAL"),
    ("hindustan aero", "HAL"),
    ("bharat electronics", "BEL"),
    ("bel", "BEL"),
    ("bharat dynamics", "BDL"),
    ("bdl", "BDL"),
    ("mazagon dock", "MAZDOCK"),
    ("cochin shipyard", "COCHINSHIP"),
    ("bharat forge", "BHARATFORG"),
    // Railways & PSU
    ("irctc", "IRCTC"),
    ("indian railway catering", "IRCTC"),
    ("rvnl", "RVNL"),
    ("rail vikas", "RVNL"),
    ("irfc", "IRFC"),
    ("indian railway finance", "IRFC"),
    ("rites", "RITES"),
    // Others
    ("titan", "TITAN"),
    ("avenue supermarts", "DMART"),
    ("dmart", "DMART"),
    ("zomato", "ZOMATO"),
    ("paytm", "PAYTM"),
    ("nykaa", "NYKAA"),
    ("policybazaar", "POLICYBZR"),
    ("trent", "TRENT"),
    ("page industries", "PAGEIND"),
    ("indigo", "INDIGO"),
    ("interglobe", "INDIGO"),
    ("havells", "HAVELLS"),
    ("dixon", "DIXON"),
    ("polycab", "POLYCAB"),
    ("siemens", "SIEMENS"),
    ("abb", "ABB"),
    ("cummins", "CUMMINSIND"),
];

/// Sector keyword groups: display name → trigger keywords
const SECTOR_KEYWORDS: &[(&str, &[&str])] = &[
    ("Defence", &["defence", "defense", "aerospace"]),
    (
        "IT",
        &["it sector", "information technology", "software", "tech sector"],
    ),
    (
        "Banking",
        &["banking", "banks", "financial sector", "finance"],
    ),
    ("Pharma", &["pharma", "pharmaceutical", "medicine", "drug"]),
    (
        "Auto",
        &["auto", "automobile", "automotive", "car", "vehicle"],
    ),
    ("FMCG", &["fmcg", "fast moving", "consumer goods"]),
    ("Energy", &["energy", "power", "oil", "gas", "renewable"]),
    (
        "Real Estate",
        &["real estate", "realty", "construction", "infrastructure"],
    ),
    ("Telecom", &["telecom", "telecommunication"]),
    ("Steel", &["steel", "metal", "iron"]),
    ("Cement", &["cement", "construction material"]),
];

/// Immutable alias → ticker table
#[derive(Debug)]
pub struct SymbolTable {
    aliases: HashMap<String, String>,
}

impl SymbolTable {
    /// Build the built-in table
    pub fn builtin() -> Arc<Self> {
        Arc::new(Self::from_entries(
            SYMBOL_ALIASES
                .iter()
                .map(|&(alias, ticker)| (alias.to_string(), ticker.to_string())),
        ))
    }

    /// Build a table from explicit entries (test fixtures)
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            aliases: entries.into_iter().collect(),
        }
    }

    /// Exact lookup of a normalized alias
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Longest alias contained in the normalized text, with its ticker
    ///
    /// Short aliases (under four characters) only match as whole words so
    /// that "hal" does not fire inside "shall". Choosing the longest match
    /// keeps the lookup deterministic when several aliases apply.
    pub fn find_in(&self, text: &str) -> Option<(&str, &str)> {
        self.aliases
            .iter()
            .filter(|(alias, _)| alias_matches(text, alias))
            .max_by_key(|(alias, _)| alias.len())
            .map(|(alias, ticker)| (alias.as_str(), ticker.as_str()))
    }

    /// Number of alias entries
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Immutable sector keyword table
#[derive(Debug)]
pub struct SectorKeywordTable {
    groups: Vec<(String, Vec<String>)>,
}

impl SectorKeywordTable {
    /// Build the built-in table
    pub fn builtin() -> Arc<Self> {
        Arc::new(Self::from_groups(SECTOR_KEYWORDS.iter().map(
            |&(name, keywords)| {
                (
                    name.to_string(),
                    keywords.iter().map(|&k| k.to_string()).collect(),
                )
            },
        )))
    }

    /// Build a table from explicit groups (test fixtures)
    pub fn from_groups(groups: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    /// Iterate over (display name, keywords) groups
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, keywords)| (name.as_str(), keywords.as_slice()))
    }
}

fn alias_matches(text: &str, alias: &str) -> bool {
    // Punctuated aliases ("m&m", "l&t") never survive tokenization
    if alias.len() >= 4 || !alias.chars().all(char::is_alphanumeric) {
        return text.contains(alias);
    }
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word == alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_large() {
        let table = SymbolTable::builtin();
        assert!(table.len() > 150);
        assert_eq!(table.get("tata motors"), Some("TATAMOTORS"));
        assert_eq!(table.get("sbi"), Some("SBIN"));
    }

    #[test]
    fn test_find_in_prefers_longest_alias() {
        let table = SymbolTable::builtin();
        // Both "kotak mahindra" and "mahindra" appear; the longer one wins
        let (alias, ticker) = table.find_in("thoughts on kotak mahindra?").unwrap();
        assert_eq!(alias, "kotak mahindra");
        assert_eq!(ticker, "KOTAKBANK");
    }

    #[test]
    fn test_short_aliases_need_word_boundaries() {
        let table = SymbolTable::builtin();
        assert!(table.find_in("shall we proceed").is_none());
        assert_eq!(table.find_in("hal stock news").unwrap().1, "HAL");
    }

    #[test]
    fn test_punctuated_short_aliases_match_as_substrings() {
        let table = SymbolTable::builtin();
        assert_eq!(table.find_in("is l&t a buy").unwrap().1, "LT");
        assert_eq!(table.find_in("m&m quarterly results").unwrap().1, "M&M");
    }

    #[test]
    fn test_fixture_substitution() {
        let table =
            SymbolTable::from_entries([("acme widgets".to_string(), "ACME".to_string())]);
        assert_eq!(table.find_in("buy acme widgets now").unwrap().1, "ACME");
        assert!(table.find_in("tata motors").is_none());
    }

    #[test]
    fn test_sector_groups_present() {
        let table = SectorKeywordTable::builtin();
        let names: Vec<&str> = table.groups().map(|(name, _)| name).collect();
        assert!(names.contains(&"Defence"));
        assert!(names.contains(&"Banking"));
    }
}
