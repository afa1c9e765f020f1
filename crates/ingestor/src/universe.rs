//! Default ticker universe for ingestion runs.

/// NYSE/NASDAQ symbols tracked by default. Overridable per run with
/// `--symbols`.
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "A", "AAL", "AAPL", "ABBV", "ABT", "ACN", "ADBE", "ADI", "ADM", "ADP",
    "ADSK", "AEE", "AEP", "AES", "AFL", "AIG", "AIZ", "AJG", "AMAT", "AMD",
    "AME", "AMGN", "AMP", "AMT", "AMZN", "AON", "AOS", "APA", "APD", "APH",
    "APTV", "ARE", "ATO", "AVB", "AVGO", "AVY", "AWK", "AXP", "BA", "BAC",
    "BAX", "BBY", "BDX", "BEN", "BG", "BIIB", "BIO", "BK", "BKNG", "BKR",
    "BLK", "BMY", "BXP", "C", "CAG", "CAH", "CARR", "CAT", "CB", "CBOE",
    "CBRE", "CCL", "CDNS", "CDW", "CE", "CF", "CFG", "CHD", "CHRW", "CHTR",
    "CI", "CINF", "CL", "CLX", "CMA", "CMCSA", "CME", "CMG", "CMI", "CMS",
    "CNC", "CNP", "COF", "COO", "COP", "COST", "CPB", "CPT", "CRL", "CRM",
    "CSCO", "CSX", "CTAS", "CTSH", "CVS", "CVX", "D", "DAL", "DHI", "DHR",
    "DIS", "DRI", "DTE", "DUK", "DVA", "DVN", "DXC", "DXCM", "EA", "EBAY",
    "ECL", "ED", "EFX", "EIX", "EL", "EMN", "EMR", "EOG", "EQIX", "EQR",
    "ES", "ESS", "ETN", "ETR", "EVRG", "EW", "EXC", "EXPE", "EXR", "F",
    "FAST", "FCX", "FDX", "FE", "FFIV", "FIS", "FITB", "FMC", "FOX", "FOXA",
    "FRT", "FTNT", "FTV", "GD", "GE", "GILD", "GIS", "GL", "GLW", "GM",
    "GNRC", "GOOG", "GOOGL", "GPC", "GPN", "GRMN", "GS", "GWW", "HAL", "HAS",
    "HCA", "HD", "HES", "HIG", "HII", "HOLX", "HON", "HPE", "HPQ", "HRL",
    "HSIC", "HST", "HSY", "HUM", "IBM", "ICE", "IDXX", "IEX", "IFF", "ILMN",
    "INCY", "INTC", "INTU", "INVH", "IP", "IPG", "IR", "IRM", "ISRG", "IT",
    "ITW", "IVZ", "JBHT", "JCI", "JNJ", "JPM", "K", "KEY", "KIM", "KLAC",
    "KMB", "KMI", "KMX", "KO", "KR", "L", "LDOS", "LEG", "LEN", "LH",
    "LKQ", "LLY", "LMT", "LNC", "LOW", "LRCX", "LUV", "LVS", "LW", "LYB",
    "MA", "MAR", "MAS", "MCD", "MCHP", "MCK", "MCO", "MDLZ", "MDT", "MET",
    "MGM", "MHK", "MKTX", "MLM", "MMC", "MMM", "MNST", "MO", "MPW", "MRK",
    "MRO", "MS", "MSCI", "MSFT", "MTB", "MTD", "MU", "NDAQ", "NEE", "NEM",
    "NFLX", "NI", "NKE", "NLY", "NNN", "NOC", "NOW", "NTRS", "NUE", "NVDA",
    "NVR", "NWL", "NWS", "NWSA", "O", "ODFL", "OMC", "ORCL", "OXY", "PAYX",
    "PCG", "PEG", "PFE", "PFG", "PG", "PGR", "PH", "PKG", "PLD", "PM",
    "PNC", "PNR", "PNW", "PPG", "PPL", "PRU", "PSA", "PSX", "PWR", "PXD",
    "QCOM", "QRVO", "RCL", "REG", "REGN", "RF", "RHI", "RJF", "RL", "RMD",
    "ROK", "ROL", "ROST", "RSG", "SBAC", "SBUX", "SCHW", "SEE", "SHW", "SJM",
    "SLB", "SLG", "SNA", "SNPS", "SO", "SPG", "SPGI", "SRE", "STE", "STT",
    "STX", "STZ", "SWK", "SWKS", "SYK", "SYY", "T", "TAP", "TDG", "TDY",
    "TEL", "TER", "TFC", "TFX", "TGT", "TJX", "TMO", "TMUS", "TOL", "TPR",
    "TROW", "TRV", "TSCO", "TSLA", "TSN", "TT", "TTWO", "TXN", "UAL", "UDR",
    "UHS", "ULTA", "UNH", "UNP", "UPS", "URI", "USB", "V", "VFC", "VLO",
    "VMC", "VNO", "VRSK", "VRSN", "VRTX", "VZ", "WAB", "WAT", "WBA", "WDC",
    "WEC", "WELL", "WFC", "WM", "WMB", "WMT", "WRB", "WST", "WYNN", "XEL",
    "XOM", "XRAY", "XYL", "YUM", "ZBH", "ZBRA", "ZION", "ZTS",
];

/// The default universe as owned strings.
pub fn default_symbols() -> Vec<String> {
    DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_universe_has_no_duplicates() {
        let unique: HashSet<&&str> = DEFAULT_UNIVERSE.iter().collect();
        assert_eq!(unique.len(), DEFAULT_UNIVERSE.len());
    }

    #[test]
    fn test_universe_symbols_are_uppercase() {
        assert!(DEFAULT_UNIVERSE
            .iter()
            .all(|s| s.chars().all(|c| c.is_ascii_uppercase())));
    }
}
