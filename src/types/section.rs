use super::SectionName;

/// Derive section codes for one semester from its student head-count.
///
/// A semester with `n` students yields `ceil(n / section_size)` sections, at
/// least one, named `S<sem><program><index>`. Deterministic and idempotent.
pub fn build_sections(
    semester: u32,
    student_count: u32,
    section_size: u32,
    program_code: &str,
) -> Vec<SectionName> {
    let size = section_size.max(1);
    let count = student_count.div_ceil(size).max(1);
    (0..count)
        .map(|i| SectionName(format!("S{}{}{}", semester, program_code, i + 1)))
        .collect()
}

/// Recover the semester number from a section name like `S3A1`
pub fn semester_of(section: &SectionName) -> Option<u32> {
    let digits: String = section
        .0
        .strip_prefix('S')?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_section_codes_follow_template() {
        let sections = build_sections(3, 120, 50, "A");
        let names: Vec<&str> = sections.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(names, vec!["S3A1", "S3A2", "S3A3"]);
    }

    #[test]
    fn test_zero_students_still_get_one_section() {
        assert_eq!(build_sections(1, 0, 50, "A").len(), 1);
    }

    #[test]
    fn test_semester_recovered_from_name() {
        assert_eq!(semester_of(&SectionName("S3A1".into())), Some(3));
        assert_eq!(semester_of(&SectionName("S10A2".into())), Some(10));
        assert_eq!(semester_of(&SectionName("X3A1".into())), None);
    }

    proptest! {
        #[test]
        fn prop_section_count_is_ceiling_division(students in 0u32..5_000, size in 1u32..200) {
            let sections = build_sections(1, students, size, "A");
            let expected = (students.div_ceil(size)).max(1) as usize;
            prop_assert_eq!(sections.len(), expected);
        }

        #[test]
        fn prop_building_twice_is_identical(students in 0u32..5_000) {
            let a = build_sections(2, students, 50, "A");
            let b = build_sections(2, students, 50, "A");
            prop_assert_eq!(a, b);
        }
    }
}
