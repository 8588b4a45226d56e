mod html_extraction_tests;
