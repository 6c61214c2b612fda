table! {
    borrowers (id) {
        id -> Integer,
        full_name -> Text,
        age -> Integer,
        gender -> Text,
        income -> Double,
        employment_status -> Text,
        employment_duration -> Integer,
        housing_status -> Text,
        created_at -> Timestamp,
    }
}

table! {
    loan_applications (id) {
        id -> Integer,
        borrower_id -> Integer,
        loan_amount -> Double,
        loan_purpose -> Text,
        tenure -> Integer,
        interest_rate -> Double,
        credit_score -> Integer,
        previous_defaults -> Integer,
        debt_to_income_ratio -> Double,
        status -> Text,
        created_at -> Timestamp,
    }
}

table! {
    prediction_history (id) {
        id -> Integer,
        application_id -> Integer,
        probability -> Double,
        risk_level -> Text,
        prediction -> Bool,
        feature_importance -> Text,
        model_version -> Text,
        created_at -> Timestamp,
    }
}

joinable!(loan_applications -> borrowers (borrower_id));
joinable!(prediction_history -> loan_applications (application_id));

allow_tables_to_appear_in_same_query!(
    borrowers,
    loan_applications,
    prediction_history,
);
