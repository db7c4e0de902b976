pub const SAMPLE_REPORT_ID: &str = "sample_001";

pub const SAMPLE_REPORT: &str = r#"EXAMINATION: XR LEFT KNEE

CLINICAL DETAILS: 4 year old with a 3 day history of left knee pain and limp. Low grade fever. Previous MRSA skin infection.

COMPARISON: None.

FINDINGS: There is a moderate suprapatellar joint effusion. No fracture or periosteal reaction. Physes are normal for age. No focal lytic or sclerotic lesion.

CONCLUSION: Knee joint effusion. No bony abnormality.

REPORTED BY: Sample Radiologist
"#;

pub const SAMPLE_GROUND_TRUTH: &str = r#"{
  "schema_version": 1,
  "records": {
    "sample_001": {
      "primary_diagnosis": "Septic arthritis",
      "differential_diagnoses": [
        "septic arthritis",
        "juvenile idiopathic arthritis",
        "transient synovitis"
      ],
      "inappropriate_diagnoses": ["osteoarthritis"],
      "key_findings": ["moderate suprapatellar effusion", "no bony abnormality"],
      "appropriate_recommendations": ["ESR, CRP, CBC", "Joint aspiration if effusion develops"],
      "notes": "sample record",
      "clinical_history": "4 year old with a 3 day history of left knee pain and limp.",
      "annotated": true
    }
  }
}
"#;

pub const GITIGNORE: &str = "/results/\n/target/\nground_truth_suggestions.json\n";
