mod business_logic;
