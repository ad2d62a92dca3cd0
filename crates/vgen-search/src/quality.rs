//! Deterministic quality scoring for image candidates.

use vgen_models::ImageCandidate;

/// Domains that consistently deliver usable editorial/lifestyle imagery.
const CURATED_DOMAINS: &[&str] = &[
    "unsplash.com",
    "pexels.com",
    "pixabay.com",
    "flickr.com",
    "wikimedia.org",
];

/// Stock libraries: watermarked previews, penalized by severity.
const STOCK_PENALTIES: &[(&str, f64)] = &[
    ("gettyimages", 0.5),
    ("alamy", 0.5),
    ("shutterstock", 0.3),
    ("istockphoto", 0.3),
    ("dreamstime", 0.2),
    ("123rf", 0.2),
];

/// Hotlink-protected or token-gated CDNs known to fail downstream fetch.
const PROTECTED_DOMAINS: &[&str] = &[
    "instagram.com",
    "cdninstagram.com",
    "fbcdn.net",
    "lookaside.fbsbx.com",
    "tiktokcdn.com",
];

/// Score a candidate from its metadata alone. Pure and deterministic.
///
/// Base 0.5, resolution bonus up to +0.4, aspect bonus for ratios that crop
/// well to 9:16 or 16:9, small bonuses for thumbnails and curated domains,
/// penalties for stock and protected domains. Clamped to [0, 1].
pub fn score_candidate(candidate: &ImageCandidate) -> f64 {
    let mut score: f64 = 0.5;

    let mp = candidate.megapixels();
    if mp > 4.0 {
        score += 0.4;
    } else if mp > 2.0 {
        score += 0.25;
    } else if mp > 1.0 {
        score += 0.1;
    }

    let aspect = candidate.aspect();
    if (1.5..=2.0).contains(&aspect) {
        // Tall images crop cleanly to 9:16
        score += 0.1;
    } else if (0.5..=0.7).contains(&aspect) {
        // Wide images crop cleanly to 16:9
        score += 0.05;
    }

    if candidate.thumbnail_url.is_some() {
        score += 0.05;
    }

    let domain = candidate.source_domain.to_lowercase();

    if CURATED_DOMAINS.iter().any(|d| domain.ends_with(d)) {
        score += 0.1;
    }

    for (stock, penalty) in STOCK_PENALTIES {
        if domain.contains(stock) {
            score -= penalty;
            break;
        }
    }

    if PROTECTED_DOMAINS.iter().any(|d| domain.contains(d)) {
        score -= 0.5;
    }

    score.clamp(0.0, 1.0)
}
