use super::*;

#[test]
fn transliterates_every_table_entry() {
    for (from, to) in TRANSLITERATIONS {
        let raw = format!("x{from}y");
        assert_eq!(sanitize(&raw), format!("x{to}y"));
    }
}

#[test]
fn output_never_contains_table_characters() {
    let all: String = TRANSLITERATIONS.iter().map(|(c, _)| *c).collect();
    let samples = [
        all.clone(),
        format!("Dør {all} ovenfra og ned"),
        "Skåp Ø 600".to_string(),
        "Straße".to_string(),
    ];
    for s in samples {
        let out = sanitize(&s);
        assert!(
            !out.chars().any(|c| all.contains(c)),
            "{out:?} still has a diacritic"
        );
    }
}

#[test]
fn spaces_kept_without_directional_phrase() {
    assert_eq!(sanitize("Dør 900 x 2100"), "Doer 900 x 2100");
}

#[test]
fn spaces_replaced_everywhere_with_directional_phrase() {
    assert_eq!(
        sanitize("Markise 3 m ovenfra og ned"),
        "Markise_3_m_ovenfra_og_ned"
    );
    assert_eq!(sanitize("Port Nedenfra og opp"), "Port_Nedenfra_og_opp");
    assert_eq!(
        sanitize("Kamera motorisert sving 2"),
        "Kamera_motorisert_sving_2"
    );
}

#[test]
fn sanitize_is_idempotent() {
    let samples = [
        "",
        "plain",
        "Dør 900 x 2100",
        "Åpning ovenfra og ned",
        "ÆØÅ æøå äöü ß",
        "motorisert sving",
        "Ventil & kran",
    ];
    for s in samples {
        let once = sanitize(s);
        assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
    }
}

#[test]
fn file_name_validity() {
    assert!(is_valid_file_name("Door&900x2100.png"));
    assert!(is_valid_file_name("Doer 900.famproj"));
    assert!(!is_valid_file_name(""));
    assert!(!is_valid_file_name("a/b.png"));
    assert!(!is_valid_file_name("a:b.png"));
    assert!(!is_valid_file_name("what?.png"));
    assert!(!is_valid_file_name("trailing."));
    assert!(!is_valid_file_name("trailing "));
    assert!(!is_valid_file_name("CON.png"));
    assert!(!is_valid_file_name("lpt1"));
    assert!(!is_valid_file_name("tab\there"));
    assert!(!is_valid_file_name(&"x".repeat(256)));
}
