// Built-in sample list offered by the "load example" action.

/// Ten entries covering the formats the parser accepts: plain names,
/// numbered items, and trailing identifiers after a space, a hyphen, brackets
/// or a label.
pub const DEMO_LIST: &str = "Aldana Camila 392
Adriihaniihta Alvarez - 990
Leila Elizabeth (544)
Gaby Cn
Sadako Yoshiko - Legajo 212
1. Juan Perez
2. Maria Gonzalez
Carlos Rodriguez
Ana Lopez 444
Pedro Martinez";

#[cfg(test)]
mod tests {
    use super::*;
    use sorteo_core::parser::parse;

    #[test]
    fn demo_list_parses_every_line() {
        let participants = parse(DEMO_LIST);
        assert_eq!(participants.len(), 10);

        let identifiers: Vec<&str> = participants
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(
            identifiers,
            vec!["392", "990", "544", "", "212", "", "", "", "444", ""]
        );
        assert_eq!(participants[1].name, "Adriihaniihta Alvarez");
        assert_eq!(participants[5].name, "Juan Perez");
    }
}
